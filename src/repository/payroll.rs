use sqlx::MySqlConnection;

use crate::model::payroll::{PayrollPreview, PayrollRunRow, PayrollStatus, Payslip};

pub async fn find_run(
    conn: &mut MySqlConnection,
    run_id: u64,
) -> Result<Option<PayrollRunRow>, sqlx::Error> {
    sqlx::query_as::<_, PayrollRunRow>(
        "SELECT id, month, year, status FROM payroll_runs WHERE id = ?",
    )
    .bind(run_id)
    .fetch_optional(conn)
    .await
}

/// Locks every run of the month in id order, so concurrent finalizers of the
/// same month queue behind each other instead of deadlocking.
pub async fn lock_runs_for_month(
    conn: &mut MySqlConnection,
    month: i32,
    year: i32,
) -> Result<Vec<PayrollRunRow>, sqlx::Error> {
    sqlx::query_as::<_, PayrollRunRow>(
        r#"
        SELECT id, month, year, status
        FROM payroll_runs
        WHERE month = ? AND year = ?
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(month)
    .bind(year)
    .fetch_all(conn)
    .await
}

pub async fn finalized_run_for(
    conn: &mut MySqlConnection,
    month: i32,
    year: i32,
) -> Result<Option<u64>, sqlx::Error> {
    sqlx::query_scalar::<_, u64>(
        "SELECT id FROM payroll_runs WHERE month = ? AND year = ? AND status = ? LIMIT 1",
    )
    .bind(month)
    .bind(year)
    .bind(PayrollStatus::Finalized.as_ref())
    .fetch_optional(conn)
    .await
}

pub async fn insert_preview_run(
    conn: &mut MySqlConnection,
    month: i32,
    year: i32,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO payroll_runs (month, year, status) VALUES (?, ?, ?)")
        .bind(month)
        .bind(year)
        .bind(PayrollStatus::Preview.as_ref())
        .execute(conn)
        .await?;
    Ok(result.last_insert_id())
}

/// PREVIEW -> FINALIZED. Zero rows means the run was not in PREVIEW.
pub async fn mark_finalized(conn: &mut MySqlConnection, run_id: u64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payroll_runs SET status = ?, finalized_at = NOW() WHERE id = ? AND status = ?",
    )
    .bind(PayrollStatus::Finalized.as_ref())
    .bind(run_id)
    .bind(PayrollStatus::Preview.as_ref())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn insert_payslip(
    conn: &mut MySqlConnection,
    run_id: u64,
    line: &PayrollPreview,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO payslips
            (payroll_run_id, employee_id, basic_salary, working_days, paid_leaves,
             unpaid_leaves, deduction_amount, net_salary)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(run_id)
    .bind(line.employee_id)
    .bind(line.basic_salary)
    .bind(line.working_days)
    .bind(line.paid_leaves)
    .bind(line.unpaid_leaves)
    .bind(line.deduction_amount)
    .bind(line.net_salary)
    .execute(conn)
    .await?;
    Ok(result.last_insert_id())
}

pub async fn payslips_for_run(
    conn: &mut MySqlConnection,
    run_id: u64,
) -> Result<Vec<Payslip>, sqlx::Error> {
    sqlx::query_as::<_, Payslip>(
        r#"
        SELECT id, payroll_run_id, employee_id, basic_salary, working_days, paid_leaves,
               unpaid_leaves, deduction_amount, net_salary, created_at
        FROM payslips
        WHERE payroll_run_id = ?
        ORDER BY employee_id
        "#,
    )
    .bind(run_id)
    .fetch_all(conn)
    .await
}
