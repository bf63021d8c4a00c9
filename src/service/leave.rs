//! Leave request lifecycle: apply (or enter on someone's behalf), edit while
//! pending, approve, reject, cancel, withdraw, and month listings.
//!
//! Paid leave is checked against the ledger row of the start date's year on
//! every write. Only approval charges the days to `used`, and only withdrawal
//! gives them back.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{MySqlConnection, MySqlPool};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::leave_request::{Leave, LeaveListing, LeaveScope, LeaveStatus, LeaveTiming};
use crate::model::payroll::PayrollStatus;
use crate::repository::{self, audit::AuditAction, leave::NewLeave};
use crate::service::{calendar, ledger, reconciler, span};

#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveInput {
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// `first-half`, `second-half` or `full-day` (default).
    #[schema(example = "full-day")]
    pub timing: Option<String>,
    #[schema(example = "Family event")]
    pub reason: String,
}

impl LeaveInput {
    pub fn timing(&self) -> AppResult<LeaveTiming> {
        self.timing
            .as_deref()
            .map(LeaveTiming::parse)
            .unwrap_or(Ok(LeaveTiming::FullDay))
    }
}

/// A leave entered by HR or an admin for another employee.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveOnBehalf {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[serde(flatten)]
    pub leave: LeaveInput,
}

/// Checks that need no database: timing, date order and a reason.
fn validate(input: &LeaveInput) -> AppResult<LeaveTiming> {
    let timing = input.timing()?;
    calendar::ensure_range(input.start_date, input.end_date)?;
    if input.reason.trim().is_empty() {
        return Err(AppError::Validation("reason is required".into()));
    }
    Ok(timing)
}

/// Computes the leave's days and runs the overlap and balance checks shared
/// by apply and edit.
async fn checked_days(
    conn: &mut MySqlConnection,
    employee_id: u64,
    input: &LeaveInput,
    timing: LeaveTiming,
    exclude_id: Option<u64>,
) -> AppResult<Decimal> {
    if !repository::employee::exists(conn, employee_id).await? {
        return Err(AppError::not_found("employee"));
    }

    let leave_type = repository::leave_type::find(conn, input.leave_type_id)
        .await?
        .ok_or_else(|| AppError::not_found("leave type"))?;

    let days = span::require_nonzero(
        span::compute_days_on(conn, input.start_date, input.end_date, timing).await?,
    )?;

    let clashes = repository::leave::overlapping(
        conn,
        employee_id,
        input.start_date,
        input.end_date,
        exclude_id,
    )
    .await?;
    if let Some(other) = clashes.first() {
        return Err(AppError::Validation(format!(
            "the requested dates overlap leave request {other}"
        )));
    }

    if leave_type.is_paid {
        let balance = ledger::get_or_create(
            conn,
            employee_id,
            leave_type.id,
            input.start_date.year(),
        )
        .await?;
        ledger::ensure_available(&balance, days)?;
    }

    Ok(days)
}

fn new_leave<'a>(employee_id: u64, input: &'a LeaveInput, timing: LeaveTiming, days: Decimal) -> NewLeave<'a> {
    NewLeave {
        employee_id,
        leave_type_id: input.leave_type_id,
        timing_id: timing.id(),
        start_date: input.start_date,
        end_date: input.end_date,
        days,
        reason: input.reason.trim(),
    }
}

pub async fn apply_leave(
    pool: &MySqlPool,
    employee_id: u64,
    actor_id: u64,
    input: &LeaveInput,
) -> AppResult<Leave> {
    let timing = validate(input)?;

    let mut tx = pool.begin().await?;
    let days = checked_days(&mut *tx, employee_id, input, timing, None).await?;
    let row = new_leave(employee_id, input, timing, days);
    let leave_id = repository::leave::insert(&mut *tx, &row).await?;
    repository::audit::record(&mut *tx, actor_id, AuditAction::Create, "leave").await?;
    tx.commit().await?;

    info!(leave_id, employee_id, days = %days, %timing, "Leave request submitted");
    Ok(Leave {
        id: leave_id,
        employee_id,
        leave_type_id: input.leave_type_id,
        timing,
        start_date: input.start_date,
        end_date: input.end_date,
        days,
        status: LeaveStatus::Pending,
        reason: row.reason.to_string(),
        charged_days: Decimal::ZERO,
    })
}

/// Rewrites a pending leave. Only the employee who requested it may edit it.
pub async fn update_pending_leave(
    pool: &MySqlPool,
    leave_id: u64,
    employee_id: u64,
    actor_id: u64,
    input: &LeaveInput,
) -> AppResult<Leave> {
    let timing = validate(input)?;

    let mut tx = pool.begin().await?;

    let current = lock_leave(&mut *tx, leave_id).await?;
    if current.employee_id != employee_id {
        return Err(AppError::Forbidden("only the requester can edit this leave".into()));
    }
    if current.status != LeaveStatus::Pending {
        return Err(AppError::Validation(format!(
            "leave {leave_id} is {} and can no longer be edited",
            current.status
        )));
    }

    let days = checked_days(&mut *tx, employee_id, input, timing, Some(leave_id)).await?;
    let row = new_leave(employee_id, input, timing, days);
    if repository::leave::update_pending(&mut *tx, leave_id, &row).await? != 1 {
        return Err(AppError::InvalidState(format!("leave {leave_id} changed during edit")));
    }
    repository::audit::record(&mut *tx, actor_id, AuditAction::Update, "leave").await?;
    tx.commit().await?;

    info!(leave_id, employee_id, days = %days, "Pending leave updated");
    Ok(Leave {
        id: leave_id,
        employee_id,
        leave_type_id: input.leave_type_id,
        timing,
        start_date: input.start_date,
        end_date: input.end_date,
        days,
        status: LeaveStatus::Pending,
        reason: row.reason.to_string(),
        charged_days: Decimal::ZERO,
    })
}

/// Charges an approved paid leave to the ledger row of its start date's year.
/// Returns the days charged, zero for unpaid types.
async fn charge_approval(conn: &mut MySqlConnection, leave: &Leave) -> AppResult<Decimal> {
    let leave_type = repository::leave_type::find(conn, leave.leave_type_id)
        .await?
        .ok_or_else(|| AppError::not_found("leave type"))?;
    if !leave_type.is_paid {
        return Ok(Decimal::ZERO);
    }

    let balance = ledger::get_or_create(
        conn,
        leave.employee_id,
        leave.leave_type_id,
        leave.start_date.year(),
    )
    .await?;
    ledger::ensure_available(&balance, leave.days)?;
    let usage = ledger::record_usage(conn, &balance, leave.days).await?;
    info!(
        leave_id = leave.id,
        employee_id = leave.employee_id,
        used = %usage.used,
        closing = %usage.closing,
        "Leave charged to balance"
    );
    Ok(leave.days)
}

async fn lock_leave(conn: &mut MySqlConnection, leave_id: u64) -> AppResult<Leave> {
    repository::leave::find_for_update(conn, leave_id)
        .await?
        .ok_or_else(|| AppError::not_found("leave"))?
        .try_into()
}

/// Pending → Approved or Rejected. Approving a paid leave charges it to the
/// ledger in the same transaction.
async fn decide(
    pool: &MySqlPool,
    leave_id: u64,
    decision: LeaveStatus,
    actor_id: u64,
) -> AppResult<Leave> {
    let mut tx = pool.begin().await?;

    let mut leave = lock_leave(&mut *tx, leave_id).await?;
    if leave.status != LeaveStatus::Pending {
        warn!(leave_id, status = %leave.status, "Decision on a leave that is not pending");
        return Err(AppError::InvalidState(format!(
            "leave {leave_id} is already {}",
            leave.status
        )));
    }

    let (action, charged) = match decision {
        LeaveStatus::Approved => (AuditAction::Approval, charge_approval(&mut *tx, &leave).await?),
        LeaveStatus::Rejected => (AuditAction::Rejection, Decimal::ZERO),
        other => {
            return Err(AppError::Validation(format!("a leave cannot be decided as {other}")));
        }
    };

    if repository::leave::decide(&mut *tx, leave_id, decision, actor_id, charged).await? != 1 {
        return Err(AppError::InvalidState(format!("leave {leave_id} is no longer pending")));
    }
    repository::audit::record(&mut *tx, actor_id, action, "leave").await?;
    tx.commit().await?;

    info!(leave_id, status = %decision, decided_by = actor_id, "Leave decided");
    leave.status = decision;
    leave.charged_days = charged;
    Ok(leave)
}

pub async fn approve_leave(pool: &MySqlPool, leave_id: u64, actor_id: u64) -> AppResult<Leave> {
    decide(pool, leave_id, LeaveStatus::Approved, actor_id).await
}

pub async fn reject_leave(pool: &MySqlPool, leave_id: u64, actor_id: u64) -> AppResult<Leave> {
    decide(pool, leave_id, LeaveStatus::Rejected, actor_id).await
}

/// Enters a leave for another employee. It runs the same checks as an
/// application and is recorded as approved, charged in the same transaction.
pub async fn add_leave_for(
    pool: &MySqlPool,
    input: &LeaveOnBehalf,
    actor_id: u64,
) -> AppResult<Leave> {
    let employee_id = input.employee_id;
    let timing = validate(&input.leave)?;

    let mut tx = pool.begin().await?;
    let days = checked_days(&mut *tx, employee_id, &input.leave, timing, None).await?;
    let row = new_leave(employee_id, &input.leave, timing, days);
    let leave_id = repository::leave::insert(&mut *tx, &row).await?;
    repository::audit::record(&mut *tx, actor_id, AuditAction::Create, "leave").await?;

    let mut leave = Leave {
        id: leave_id,
        employee_id,
        leave_type_id: input.leave.leave_type_id,
        timing,
        start_date: input.leave.start_date,
        end_date: input.leave.end_date,
        days,
        status: LeaveStatus::Pending,
        reason: row.reason.to_string(),
        charged_days: Decimal::ZERO,
    };
    let charged = charge_approval(&mut *tx, &leave).await?;
    if repository::leave::decide(&mut *tx, leave_id, LeaveStatus::Approved, actor_id, charged)
        .await?
        != 1
    {
        return Err(AppError::InvalidState(format!("leave {leave_id} changed while being added")));
    }
    repository::audit::record(&mut *tx, actor_id, AuditAction::Approval, "leave").await?;
    tx.commit().await?;

    info!(leave_id, employee_id, days = %days, added_by = actor_id, "Leave added on behalf of employee");
    leave.status = LeaveStatus::Approved;
    leave.charged_days = charged;
    Ok(leave)
}

/// Pending → Cancelled. With `owner` set, only that employee's leave may be
/// cancelled.
pub async fn cancel_leave(
    pool: &MySqlPool,
    leave_id: u64,
    owner: Option<u64>,
    actor_id: u64,
) -> AppResult<Leave> {
    let mut tx = pool.begin().await?;

    let mut leave = lock_leave(&mut *tx, leave_id).await?;
    if owner.is_some_and(|employee_id| employee_id != leave.employee_id) {
        return Err(AppError::Forbidden("only the requester can cancel this leave".into()));
    }
    if leave.status != LeaveStatus::Pending {
        return Err(AppError::InvalidState(format!(
            "leave {leave_id} is {} and can no longer be cancelled",
            leave.status
        )));
    }

    if repository::leave::decide(&mut *tx, leave_id, LeaveStatus::Cancelled, actor_id, Decimal::ZERO)
        .await?
        != 1
    {
        return Err(AppError::InvalidState(format!("leave {leave_id} is no longer pending")));
    }
    repository::audit::record(&mut *tx, actor_id, AuditAction::Cancel, "leave").await?;
    tx.commit().await?;

    info!(leave_id, cancelled_by = actor_id, "Leave cancelled");
    leave.status = LeaveStatus::Cancelled;
    Ok(leave)
}

/// (month, year) of every calendar month from `start` through `end`.
fn months_spanned(start: NaiveDate, end: NaiveDate) -> Vec<(i32, i32)> {
    let mut months = Vec::new();
    let (mut year, mut month) = (start.year(), start.month() as i32);
    while (year, month) <= (end.year(), end.month() as i32) {
        months.push((month, year));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    months
}

/// Approved → Withdrawn, crediting charged days back to the ledger row they
/// came from. Refused once any month the leave touches has a finalized
/// payroll run; the runs are locked so a finalize cannot start meanwhile.
pub async fn withdraw_leave(
    pool: &MySqlPool,
    leave_id: u64,
    reason: &str,
    actor_id: u64,
) -> AppResult<Leave> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::Validation("a withdrawal reason is required".into()));
    }

    let mut tx = pool.begin().await?;

    let mut leave = lock_leave(&mut *tx, leave_id).await?;
    if leave.status != LeaveStatus::Approved {
        return Err(AppError::InvalidState(format!(
            "leave {leave_id} is {}; only approved leave can be withdrawn",
            leave.status
        )));
    }

    for (month, year) in months_spanned(leave.start_date, leave.end_date) {
        let runs = repository::payroll::lock_runs_for_month(&mut *tx, month, year).await?;
        if runs
            .iter()
            .any(|r| r.parsed_status() == Some(PayrollStatus::Finalized))
        {
            warn!(leave_id, month, year, "Withdrawal refused; payroll already finalized");
            return Err(AppError::AlreadyFinalized { month, year });
        }
    }

    if leave.charged_days > Decimal::ZERO {
        let usage = ledger::release_usage(
            &mut *tx,
            leave.employee_id,
            leave.leave_type_id,
            leave.start_date.year(),
            leave.charged_days,
        )
        .await?;
        info!(
            leave_id,
            employee_id = leave.employee_id,
            credited = %leave.charged_days,
            closing = %usage.closing,
            "Withdrawn leave credited to balance"
        );
    }

    if repository::leave::withdraw(&mut *tx, leave_id, actor_id, reason).await? != 1 {
        return Err(AppError::InvalidState(format!("leave {leave_id} is no longer approved")));
    }
    repository::audit::record(&mut *tx, actor_id, AuditAction::Withdrawal, "leave").await?;
    tx.commit().await?;

    info!(leave_id, withdrawn_by = actor_id, reason, "Approved leave withdrawn");
    leave.status = LeaveStatus::Withdrawn;
    leave.charged_days = Decimal::ZERO;
    Ok(leave)
}

/// Leaves in scope starting in the given month or later.
pub async fn list_leaves(
    pool: &MySqlPool,
    scope: LeaveScope,
    month: i32,
    year: i32,
) -> AppResult<Vec<LeaveListing>> {
    let bounds = reconciler::month_bounds(month, year)?;
    let mut conn = pool.acquire().await?;
    repository::leave::list_from(&mut conn, scope, bounds.first)
        .await?
        .into_iter()
        .map(LeaveListing::try_from)
        .collect()
}

pub async fn get_leave(pool: &MySqlPool, leave_id: u64) -> AppResult<Leave> {
    let mut conn = pool.acquire().await?;
    repository::leave::find(&mut conn, leave_id)
        .await?
        .ok_or_else(|| AppError::not_found("leave"))?
        .try_into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(start: (i32, u32, u32), end: (i32, u32, u32), timing: Option<&str>) -> LeaveInput {
        LeaveInput {
            leave_type_id: 1,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            timing: timing.map(str::to_string),
            reason: "Family event".into(),
        }
    }

    #[test]
    fn timing_defaults_to_full_day() {
        let req = input((2025, 3, 3), (2025, 3, 4), None);
        assert_eq!(validate(&req).unwrap(), LeaveTiming::FullDay);
    }

    #[test]
    fn unknown_timing_is_rejected_before_dates() {
        let req = input((2025, 3, 5), (2025, 3, 4), Some("evening"));
        assert_eq!(validate(&req).unwrap_err().kind(), "invalid_timing_mode");
    }

    #[test]
    fn reversed_dates_are_invalid_range() {
        let req = input((2025, 3, 5), (2025, 3, 4), Some("first-half"));
        assert_eq!(validate(&req).unwrap_err().kind(), "invalid_range");
    }

    #[test]
    fn blank_reason_is_rejected() {
        let mut req = input((2025, 3, 3), (2025, 3, 3), Some("second-half"));
        req.reason = "   ".into();
        assert_eq!(validate(&req).unwrap_err().kind(), "validation");
    }

    #[test]
    fn months_spanned_crosses_year_end() {
        let months = months_spanned(
            NaiveDate::from_ymd_opt(2025, 12, 29).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
        );
        assert_eq!(months, vec![(12, 2025), (1, 2026)]);
    }

    #[test]
    fn months_spanned_single_month() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        assert_eq!(months_spanned(day, day), vec![(3, 2025)]);
    }

    #[test]
    fn on_behalf_input_reads_flattened_leave() {
        let input: LeaveOnBehalf = serde_json::from_value(serde_json::json!({
            "employee_id": 1000,
            "leave_type_id": 2,
            "start_date": "2025-03-03",
            "end_date": "2025-03-04",
            "reason": "Hospital stay"
        }))
        .unwrap();
        assert_eq!(input.employee_id, 1000);
        assert_eq!(input.leave.leave_type_id, 2);
        assert_eq!(validate(&input.leave).unwrap(), LeaveTiming::FullDay);
    }

    #[test]
    fn new_leave_stores_timing_id_and_trimmed_reason() {
        let mut req = input((2025, 3, 3), (2025, 3, 3), Some("second-half"));
        req.reason = "  Dentist ".into();
        let row = new_leave(7, &req, LeaveTiming::SecondHalf, Decimal::new(5, 1));
        assert_eq!(row.timing_id, 2);
        assert_eq!(row.reason, "Dentist");
        assert_eq!(row.employee_id, 7);
    }
}
