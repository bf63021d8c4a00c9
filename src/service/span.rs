//! Leave span → fractional day count.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{MySqlConnection, MySqlPool};

use crate::error::{AppError, AppResult};
use crate::model::leave_request::LeaveTiming;
use crate::service::calendar::{self, HolidaySet};

/// Working days in `[start, end]` scaled by the timing mode. A span with no
/// working day yields zero; see [`require_nonzero`].
pub fn compute_days(
    start: NaiveDate,
    end: NaiveDate,
    timing: LeaveTiming,
    holidays: &HolidaySet,
) -> AppResult<Decimal> {
    let base = calendar::working_days_between(start, end, holidays)?;
    Ok(calendar::apply_timing(Decimal::from(base), timing))
}

/// A leave covering no working day is meaningless and must not be stored.
pub fn require_nonzero(days: Decimal) -> AppResult<Decimal> {
    if days.is_zero() {
        return Err(AppError::Validation(
            "the requested dates contain no working days".to_string(),
        ));
    }
    Ok(days)
}

/// Computes a span on an open connection or transaction.
pub async fn compute_days_on(
    conn: &mut MySqlConnection,
    start: NaiveDate,
    end: NaiveDate,
    timing: LeaveTiming,
) -> AppResult<Decimal> {
    calendar::ensure_range(start, end)?;
    let holidays = HolidaySet::load(conn, start, end).await?;
    compute_days(start, end, timing, &holidays)
}

/// Range is validated before a connection is taken from the pool.
pub async fn compute_leave_days(
    pool: &MySqlPool,
    start: NaiveDate,
    end: NaiveDate,
    timing: LeaveTiming,
) -> AppResult<Decimal> {
    calendar::ensure_range(start, end)?;
    let mut conn = pool.acquire().await?;
    compute_days_on(&mut conn, start, end, timing).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn single_half_day_is_half() {
        let days = compute_days(
            date(2025, 3, 4),
            date(2025, 3, 4),
            LeaveTiming::SecondHalf,
            &HolidaySet::default(),
        );
        assert_eq!(days.unwrap(), Decimal::new(5, 1));
    }

    #[test]
    fn single_full_working_day_is_one() {
        let days = compute_days(
            date(2025, 3, 4),
            date(2025, 3, 4),
            LeaveTiming::FullDay,
            &HolidaySet::default(),
        );
        assert_eq!(days.unwrap(), Decimal::ONE);
    }

    #[test]
    fn week_straddling_weekend_skips_it() {
        // Thursday to the following Tuesday: Thu, Fri, Mon, Tue.
        let days = compute_days(
            date(2025, 3, 6),
            date(2025, 3, 11),
            LeaveTiming::FullDay,
            &HolidaySet::default(),
        );
        assert_eq!(days.unwrap(), Decimal::new(4, 0));
    }

    #[test]
    fn half_days_over_a_week_are_halved() {
        let days = compute_days(
            date(2025, 3, 3),
            date(2025, 3, 7),
            LeaveTiming::FirstHalf,
            &HolidaySet::default(),
        );
        assert_eq!(days.unwrap(), Decimal::new(25, 1));
    }

    #[test]
    fn holiday_only_span_is_zero_and_rejected() {
        let holidays: HolidaySet = [date(2025, 3, 4)].into_iter().collect();
        let days = compute_days(date(2025, 3, 4), date(2025, 3, 4), LeaveTiming::FullDay, &holidays)
            .unwrap();
        assert!(days.is_zero());
        assert_eq!(require_nonzero(days).unwrap_err().kind(), "validation");
    }

    #[test]
    fn end_before_start_is_invalid_range() {
        let err = compute_days(
            date(2025, 3, 5),
            date(2025, 3, 4),
            LeaveTiming::FullDay,
            &HolidaySet::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "invalid_range");
    }
}
