//! Monthly paid/unpaid leave totals for payroll.
//!
//! Each approved leave is clipped to the month and walked one day at a time;
//! weekends and holidays inside the month are skipped. A single-day leave
//! with a fractional day count (a half day) contributes that fraction; every
//! other leave contributes one whole day per remaining working day, so
//! multi-day half-day leaves are counted as whole days.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{MySqlConnection, MySqlPool};
use tracing::debug;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::leave_request::ApprovedLeaveSpan;
use crate::repository;
use crate::service::calendar::{self, HolidaySet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
pub struct MonthlyLeaveSummary {
    #[schema(example = "1", value_type = String)]
    pub paid_days: Decimal,
    #[schema(example = "2", value_type = String)]
    pub unpaid_days: Decimal,
}

/// First and last calendar day of a payroll month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthBounds {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

pub fn month_bounds(month: i32, year: i32) -> AppResult<MonthBounds> {
    let invalid = || AppError::Validation(format!("month must be between 1 and 12, got {month}"));

    let m = u32::try_from(month).map_err(|_| invalid())?;
    let first = NaiveDate::from_ymd_opt(year, m, 1).ok_or_else(invalid)?;
    let (next_year, next_month) = if m == 12 { (year + 1, 1) } else { (year, m + 1) };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| AppError::Validation(format!("year {year} is out of range")))?;

    Ok(MonthBounds { first, last })
}

fn per_day_unit(span: &ApprovedLeaveSpan) -> Decimal {
    if span.start_date == span.end_date && span.days < Decimal::ONE {
        span.days
    } else {
        Decimal::ONE
    }
}

/// Pure day-walk over already-fetched spans.
pub fn reconcile_spans(
    spans: &[ApprovedLeaveSpan],
    bounds: &MonthBounds,
    holidays: &HolidaySet,
) -> MonthlyLeaveSummary {
    let mut summary = MonthlyLeaveSummary::default();

    for span in spans {
        let start = span.start_date.max(bounds.first);
        let end = span.end_date.min(bounds.last);
        if end < start {
            continue;
        }

        let days = calendar::working_dates(start, end, holidays).count();
        let contribution = per_day_unit(span) * Decimal::from(days);

        if span.is_paid {
            summary.paid_days += contribution;
        } else {
            summary.unpaid_days += contribution;
        }
    }

    summary
}

/// Reconciles one employee against a holiday set already loaded for the
/// month. Payroll calls this once per employee inside its transaction.
pub async fn reconcile_for(
    conn: &mut MySqlConnection,
    employee_id: u64,
    bounds: &MonthBounds,
    holidays: &HolidaySet,
) -> AppResult<MonthlyLeaveSummary> {
    let spans =
        repository::leave::approved_spans(conn, employee_id, bounds.first, bounds.last).await?;
    let summary = reconcile_spans(&spans, bounds, holidays);
    debug!(
        employee_id,
        leaves = spans.len(),
        paid = %summary.paid_days,
        unpaid = %summary.unpaid_days,
        "Month reconciled"
    );
    Ok(summary)
}

pub async fn reconcile_month(
    pool: &MySqlPool,
    employee_id: u64,
    month: i32,
    year: i32,
) -> AppResult<MonthlyLeaveSummary> {
    let bounds = month_bounds(month, year)?;
    let mut conn = pool.acquire().await?;

    if !repository::employee::exists(&mut conn, employee_id).await? {
        return Err(AppError::not_found("employee"));
    }

    let holidays = HolidaySet::load(&mut conn, bounds.first, bounds.last).await?;
    reconcile_for(&mut conn, employee_id, &bounds, &holidays).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(value: i64, scale: u32) -> Decimal {
        Decimal::new(value, scale)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn span(start: NaiveDate, end: NaiveDate, days: Decimal, is_paid: bool) -> ApprovedLeaveSpan {
        ApprovedLeaveSpan {
            start_date: start,
            end_date: end,
            days,
            is_paid,
        }
    }

    #[test]
    fn month_bounds_handle_december_and_leap_february() {
        let dec = month_bounds(12, 2025).unwrap();
        assert_eq!(dec.first, date(2025, 12, 1));
        assert_eq!(dec.last, date(2025, 12, 31));

        let feb = month_bounds(2, 2024).unwrap();
        assert_eq!(feb.last, date(2024, 2, 29));
    }

    #[test]
    fn month_out_of_range_is_validation() {
        assert_eq!(month_bounds(13, 2025).unwrap_err().kind(), "validation");
        assert_eq!(month_bounds(0, 2025).unwrap_err().kind(), "validation");
        assert_eq!(month_bounds(-1, 2025).unwrap_err().kind(), "validation");
    }

    #[test]
    fn no_leaves_yield_zeros() {
        let bounds = month_bounds(3, 2025).unwrap();
        let summary = reconcile_spans(&[], &bounds, &HolidaySet::default());
        assert_eq!(summary, MonthlyLeaveSummary::default());
    }

    #[test]
    fn leave_crossing_months_only_counts_days_inside_each_month() {
        // Unpaid leave Fri 2025-03-28 .. Thu 2025-04-03, holiday on 2025-04-01.
        let leave = span(date(2025, 3, 28), date(2025, 4, 3), d(4, 0), false);
        let holidays: HolidaySet = [date(2025, 4, 1)].into_iter().collect();

        let march = month_bounds(3, 2025).unwrap();
        let april = month_bounds(4, 2025).unwrap();

        // March: Fri 28 and Mon 31.
        let m = reconcile_spans(std::slice::from_ref(&leave), &march, &holidays);
        assert_eq!(m.unpaid_days, d(2, 0));
        assert!(m.paid_days.is_zero());

        // April: Wed 2 and Thu 3; Tue 1 is a holiday.
        let a = reconcile_spans(std::slice::from_ref(&leave), &april, &holidays);
        assert_eq!(a.unpaid_days, d(2, 0));
    }

    #[test]
    fn single_half_day_contributes_its_fraction() {
        let bounds = month_bounds(3, 2025).unwrap();
        let leave = span(date(2025, 3, 4), date(2025, 3, 4), d(5, 1), true);
        let summary = reconcile_spans(&[leave], &bounds, &HolidaySet::default());
        assert_eq!(summary.paid_days, d(5, 1));
        assert!(summary.unpaid_days.is_zero());
    }

    #[test]
    fn multi_day_half_day_leave_counts_whole_days() {
        let bounds = month_bounds(3, 2025).unwrap();
        // Mon..Wed stored as 1.5 days but walked as three whole days.
        let leave = span(date(2025, 3, 3), date(2025, 3, 5), d(15, 1), false);
        let summary = reconcile_spans(&[leave], &bounds, &HolidaySet::default());
        assert_eq!(summary.unpaid_days, d(3, 0));
    }

    #[test]
    fn paid_and_unpaid_are_accumulated_separately() {
        let bounds = month_bounds(3, 2025).unwrap();
        let spans = [
            span(date(2025, 3, 3), date(2025, 3, 3), d(1, 0), true),
            span(date(2025, 3, 10), date(2025, 3, 11), d(2, 0), false),
            span(date(2025, 3, 12), date(2025, 3, 12), d(5, 1), false),
        ];
        let summary = reconcile_spans(&spans, &bounds, &HolidaySet::default());
        assert_eq!(summary.paid_days, d(1, 0));
        assert_eq!(summary.unpaid_days, d(25, 1));
    }

    #[test]
    fn half_day_on_a_holiday_contributes_nothing() {
        let bounds = month_bounds(3, 2025).unwrap();
        let holidays: HolidaySet = [date(2025, 3, 4)].into_iter().collect();
        let leave = span(date(2025, 3, 4), date(2025, 3, 4), d(5, 1), false);
        let summary = reconcile_spans(&[leave], &bounds, &holidays);
        assert!(summary.unpaid_days.is_zero());
    }
}
