use sqlx::MySqlConnection;

use crate::model::employee::PayrollEmployee;

/// Active employees who joined on or before the given (year, month). A
/// mid-month joiner is paid for that month.
pub async fn payroll_eligible(
    conn: &mut MySqlConnection,
    month: i32,
    year: i32,
) -> Result<Vec<PayrollEmployee>, sqlx::Error> {
    sqlx::query_as::<_, PayrollEmployee>(
        r#"
        SELECT id, first_name, last_name, COALESCE(salary, 0) AS salary, hire_date
        FROM employees
        WHERE status = 'active'
        AND (
            YEAR(hire_date) < ?
            OR (YEAR(hire_date) = ? AND MONTH(hire_date) <= ?)
        )
        ORDER BY id
        "#,
    )
    .bind(year)
    .bind(year)
    .bind(month)
    .fetch_all(conn)
    .await
}

pub async fn exists(conn: &mut MySqlConnection, employee_id: u64) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, i64>("SELECT EXISTS(SELECT 1 FROM employees WHERE id = ?)")
        .bind(employee_id)
        .fetch_one(conn)
        .await?;
    Ok(found > 0)
}
