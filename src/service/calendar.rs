//! Working-day calendar.
//!
//! Weekends (Saturday, Sunday) and company holidays are non-working. All
//! bounds are `NaiveDate`, so there is no time-of-day or timezone component
//! that could shift a day across midnight.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use sqlx::MySqlConnection;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::model::leave_request::LeaveTiming;
use crate::repository;

/// Holiday dates for a range, fetched once and looked up per day.
#[derive(Debug, Clone, Default)]
pub struct HolidaySet(HashSet<NaiveDate>);

impl HolidaySet {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.0.contains(&date)
    }

    /// Loads every holiday in `[start, end]` with a single query.
    pub async fn load(
        conn: &mut MySqlConnection,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Self> {
        let holidays = repository::holiday::between(conn, start, end).await?;
        Ok(holidays.into_iter().map(|h| h.date).collect())
    }
}

impl FromIterator<NaiveDate> for HolidaySet {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        HolidaySet(iter.into_iter().collect())
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn is_working_day(date: NaiveDate, holidays: &HolidaySet) -> bool {
    !is_weekend(date) && !holidays.contains(date)
}

pub fn ensure_range(start: NaiveDate, end: NaiveDate) -> AppResult<()> {
    if end < start {
        return Err(AppError::InvalidRange { start, end });
    }
    Ok(())
}

/// Every working day in `[start, end]`, in order. Empty when `end < start`.
pub fn working_dates(
    start: NaiveDate,
    end: NaiveDate,
    holidays: &HolidaySet,
) -> impl Iterator<Item = NaiveDate> + '_ {
    start
        .iter_days()
        .take_while(move |d| *d <= end)
        .filter(move |d| is_working_day(*d, holidays))
}

/// Inclusive count of working days between `start` and `end`.
pub fn working_days_between(
    start: NaiveDate,
    end: NaiveDate,
    holidays: &HolidaySet,
) -> AppResult<u32> {
    ensure_range(start, end)?;
    let count = working_dates(start, end, holidays).count() as u32;
    debug!(%start, %end, count, "Working days counted");
    Ok(count)
}

/// Scales a whole-day count by the leave timing: half-day modes count half.
pub fn apply_timing(base_days: Decimal, timing: LeaveTiming) -> Decimal {
    if timing.is_half_day() {
        base_days * Decimal::new(5, 1)
    } else {
        base_days
    }
}
