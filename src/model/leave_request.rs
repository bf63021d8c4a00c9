use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Which part of each day a leave covers. Stored as `timing_id`
/// (1 = first half, 2 = second half, 3 = full day).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
    ToSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum LeaveTiming {
    #[strum(to_string = "first-half")]
    FirstHalf,
    #[strum(to_string = "second-half")]
    SecondHalf,
    #[default]
    #[strum(to_string = "full-day", serialize = "full")]
    FullDay,
}

impl LeaveTiming {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(LeaveTiming::FirstHalf),
            2 => Some(LeaveTiming::SecondHalf),
            3 => Some(LeaveTiming::FullDay),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            LeaveTiming::FirstHalf => 1,
            LeaveTiming::SecondHalf => 2,
            LeaveTiming::FullDay => 3,
        }
    }

    /// Parses the wire designation, rejecting anything unknown.
    pub fn parse(value: &str) -> AppResult<Self> {
        value
            .parse()
            .map_err(|_| AppError::InvalidTimingMode(value.to_string()))
    }

    pub fn is_half_day(self) -> bool {
        matches!(self, LeaveTiming::FirstHalf | LeaveTiming::SecondHalf)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    /// Pending leave called off before a decision.
    Cancelled,
    /// Approved leave taken back; any charged days are credited again.
    Withdrawn,
}

/// Which leaves a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveScope {
    /// One employee's own leaves.
    Own(u64),
    /// A manager's leaves plus those of everyone reporting to them.
    Team(u64),
    All,
}

/// A leave request as validated at the data-access boundary.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Leave {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    pub timing: LeaveTiming,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "3", value_type = String)]
    pub days: Decimal,
    pub status: LeaveStatus,
    pub reason: String,
    /// Days taken from the ledger at approval; zero for unpaid types and
    /// for leaves that are not approved.
    #[schema(example = "3", value_type = String)]
    pub charged_days: Decimal,
}

/// Raw `leave_requests` row.
#[derive(Debug, sqlx::FromRow)]
pub struct LeaveRow {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub timing_id: u8,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Decimal,
    pub status: String,
    pub reason: String,
    pub charged_days: Decimal,
}

fn parse_status(leave_id: u64, status: &str) -> AppResult<LeaveStatus> {
    status.parse::<LeaveStatus>().map_err(|_| {
        AppError::Internal(format!("leave {leave_id} has unknown status '{status}'"))
    })
}

impl TryFrom<LeaveRow> for Leave {
    type Error = AppError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let timing = LeaveTiming::from_id(row.timing_id)
            .ok_or_else(|| AppError::InvalidTimingMode(row.timing_id.to_string()))?;
        let status = parse_status(row.id, &row.status)?;

        Ok(Leave {
            id: row.id,
            employee_id: row.employee_id,
            leave_type_id: row.leave_type_id,
            timing,
            start_date: row.start_date,
            end_date: row.end_date,
            days: row.days,
            status,
            reason: row.reason,
            charged_days: row.charged_days,
        })
    }
}

/// A leave as shown in month listings, with employee and type names.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaveListing {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "Jane Doe")]
    pub employee: String,
    #[schema(example = "Annual")]
    pub leave_type: String,
    pub is_paid: bool,
    pub timing: LeaveTiming,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "3", value_type = String)]
    pub days: Decimal,
    pub status: LeaveStatus,
    pub reason: String,
    #[schema(example = "2025-12-20T09:00:00", value_type = String, format = "date-time")]
    pub applied_at: NaiveDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct LeaveListingRow {
    pub id: u64,
    pub employee_id: u64,
    pub employee: String,
    pub leave_type: String,
    pub is_paid: bool,
    pub timing_id: u8,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Decimal,
    pub status: String,
    pub reason: String,
    pub applied_at: NaiveDateTime,
}

impl TryFrom<LeaveListingRow> for LeaveListing {
    type Error = AppError;

    fn try_from(row: LeaveListingRow) -> Result<Self, Self::Error> {
        let timing = LeaveTiming::from_id(row.timing_id)
            .ok_or_else(|| AppError::InvalidTimingMode(row.timing_id.to_string()))?;
        let status = parse_status(row.id, &row.status)?;
        Ok(LeaveListing {
            id: row.id,
            employee_id: row.employee_id,
            employee: row.employee,
            leave_type: row.leave_type,
            is_paid: row.is_paid,
            timing,
            start_date: row.start_date,
            end_date: row.end_date,
            days: row.days,
            status,
            reason: row.reason,
            applied_at: row.applied_at,
        })
    }
}

/// An approved leave overlapping a payroll month, joined with its type's
/// `is_paid` flag.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApprovedLeaveSpan {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Decimal,
    pub is_paid: bool,
}
