//! Payroll runs: PREVIEW computation and FINALIZED payslips.
//!
//! A run is created in PREVIEW by [`run_preview`] and moved to FINALIZED by
//! [`finalize`], which recomputes every line and writes the payslips in the
//! same transaction as the status flip. Runs of one month are locked
//! together during finalization, so a month is finalized at most once.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use sqlx::{MySqlConnection, MySqlPool};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::employee::PayrollEmployee;
use crate::model::payroll::{
    FinalizedPayroll, PayrollPreview, PayrollRun, PayrollRunPreview, PayrollStatus, Payslip,
};
use crate::repository::{self, audit::AuditAction};
use crate::service::calendar::HolidaySet;
use crate::service::reconciler::{self, MonthlyLeaveSummary};

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct RunPayroll {
    #[schema(example = 3)]
    pub month: i32,
    #[schema(example = 2025)]
    pub year: i32,
}

/// Two decimal places, always carried at scale 2 so `2000` renders as `2000.00`.
fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Payroll may only run for a month that has fully elapsed.
pub fn ensure_elapsed(month: i32, year: i32, today: NaiveDate) -> AppResult<()> {
    let current_year = today.year();
    let current_month = today.month() as i32;
    if year > current_year || (year == current_year && month >= current_month) {
        return Err(AppError::FutureMonth { month, year });
    }
    Ok(())
}

/// Company setting when positive, otherwise the configured fallback.
pub fn effective_working_days(setting: Option<i32>, fallback: i32) -> i32 {
    match setting {
        Some(days) if days > 0 => days,
        _ => fallback,
    }
}

/// `deduction = salary / working_days * unpaid_days`, `net = salary - deduction`.
/// `working_days` must be positive.
pub fn compute_pay(
    employee: &PayrollEmployee,
    working_days: i32,
    summary: &MonthlyLeaveSummary,
) -> PayrollPreview {
    let salary = employee.salary;
    let daily = salary / Decimal::from(working_days);
    let deduction = round_money(daily * summary.unpaid_days);
    let net = round_money(salary - deduction);

    PayrollPreview {
        employee_id: employee.id,
        employee_name: employee.full_name(),
        basic_salary: salary,
        working_days,
        paid_leaves: summary.paid_days,
        unpaid_leaves: summary.unpaid_days,
        deduction_amount: deduction,
        net_salary: net,
    }
}

/// Computes every eligible employee's line for the month. Holidays and the
/// working-day setting are read once for the whole batch.
async fn compute_lines(
    conn: &mut MySqlConnection,
    month: i32,
    year: i32,
    fallback_working_days: i32,
) -> AppResult<Vec<PayrollPreview>> {
    let bounds = reconciler::month_bounds(month, year)?;
    let setting = repository::settings::working_days_per_month(conn).await?;
    let working_days = effective_working_days(setting, fallback_working_days);
    if working_days <= 0 {
        return Err(AppError::Internal(format!(
            "working days per month must be positive, got {working_days}"
        )));
    }

    let employees = repository::employee::payroll_eligible(conn, month, year).await?;
    let holidays = HolidaySet::load(conn, bounds.first, bounds.last).await?;

    let mut lines = Vec::with_capacity(employees.len());
    for employee in &employees {
        let summary = reconciler::reconcile_for(conn, employee.id, &bounds, &holidays).await?;
        lines.push(compute_pay(employee, working_days, &summary));
    }
    Ok(lines)
}

pub async fn run_preview(
    pool: &MySqlPool,
    input: RunPayroll,
    actor_id: u64,
    fallback_working_days: i32,
    today: NaiveDate,
) -> AppResult<PayrollRunPreview> {
    let RunPayroll { month, year } = input;
    reconciler::month_bounds(month, year)?;
    ensure_elapsed(month, year, today)?;

    let mut tx = pool.begin().await?;

    if let Some(run_id) = repository::payroll::finalized_run_for(&mut *tx, month, year).await? {
        warn!(run_id, month, year, "Preview requested for a finalized month");
        return Err(AppError::AlreadyFinalized { month, year });
    }

    let lines = compute_lines(&mut *tx, month, year, fallback_working_days).await?;
    let run_id = repository::payroll::insert_preview_run(&mut *tx, month, year).await?;
    repository::audit::record(&mut *tx, actor_id, AuditAction::Run, "payroll").await?;

    tx.commit().await?;

    info!(run_id, month, year, employees = lines.len(), "Payroll preview created");
    Ok(PayrollRunPreview {
        run: PayrollRun {
            id: run_id,
            month,
            year,
            status: PayrollStatus::Preview,
        },
        lines,
    })
}

pub async fn finalize(
    pool: &MySqlPool,
    run_id: u64,
    actor_id: u64,
    fallback_working_days: i32,
) -> AppResult<FinalizedPayroll> {
    let mut tx = pool.begin().await?;

    let run = repository::payroll::find_run(&mut *tx, run_id)
        .await?
        .ok_or_else(|| AppError::not_found("payroll run"))?;
    let (month, year) = (run.month, run.year);

    // Locking reads see the latest committed state, so a finalizer that
    // queued behind another one observes its FINALIZED status here.
    let locked = repository::payroll::lock_runs_for_month(&mut *tx, month, year).await?;
    let own = locked
        .iter()
        .find(|r| r.id == run_id)
        .ok_or_else(|| AppError::not_found("payroll run"))?;

    match own.parsed_status() {
        Some(PayrollStatus::Preview) => {}
        Some(PayrollStatus::Finalized) => {
            warn!(run_id, "Payroll run already finalized");
            return Err(AppError::AlreadyFinalized { month, year });
        }
        None => {
            return Err(AppError::InvalidState(format!(
                "payroll run {run_id} has status '{}'",
                own.status
            )));
        }
    }

    if let Some(other) = locked
        .iter()
        .find(|r| r.parsed_status() == Some(PayrollStatus::Finalized))
    {
        warn!(run_id, finalized_run = other.id, month, year, "Month already finalized by another run");
        return Err(AppError::AlreadyFinalized { month, year });
    }

    let lines = compute_lines(&mut *tx, month, year, fallback_working_days).await?;
    for line in &lines {
        repository::payroll::insert_payslip(&mut *tx, run_id, line).await?;
    }

    let flipped = repository::payroll::mark_finalized(&mut *tx, run_id).await?;
    if flipped != 1 {
        return Err(AppError::InvalidState(format!(
            "payroll run {run_id} left PREVIEW during finalization"
        )));
    }

    repository::audit::record(&mut *tx, actor_id, AuditAction::Finalize, "payroll").await?;
    let payslips = repository::payroll::payslips_for_run(&mut *tx, run_id).await?;

    tx.commit().await?;

    info!(run_id, month, year, payslips = payslips.len(), "Payroll finalized");
    Ok(FinalizedPayroll {
        run: PayrollRun {
            id: run_id,
            month,
            year,
            status: PayrollStatus::Finalized,
        },
        payslips,
    })
}

pub async fn payslips(pool: &MySqlPool, run_id: u64) -> AppResult<Vec<Payslip>> {
    let mut conn = pool.acquire().await?;
    if repository::payroll::find_run(&mut conn, run_id).await?.is_none() {
        return Err(AppError::not_found("payroll run"));
    }
    Ok(repository::payroll::payslips_for_run(&mut conn, run_id).await?)
}
