use rust_decimal::Decimal;
use sqlx::MySqlConnection;

use crate::model::leave_balance::{LeaveAdjustment, LeaveBalance};

const COLUMNS: &str = "id, employee_id, leave_type_id, year, opening, accrued, used, adjusted, closing";

/// `SELECT … FOR UPDATE`; the lock is held until the caller's transaction ends.
pub async fn find_for_update(
    conn: &mut MySqlConnection,
    employee_id: u64,
    leave_type_id: u64,
    year: i32,
) -> Result<Option<LeaveBalance>, sqlx::Error> {
    let query = format!(
        "SELECT {COLUMNS} FROM leave_balances \
         WHERE employee_id = ? AND leave_type_id = ? AND year = ? \
         FOR UPDATE"
    );
    sqlx::query_as::<_, LeaveBalance>(&query)
        .bind(employee_id)
        .bind(leave_type_id)
        .bind(year)
        .fetch_optional(conn)
        .await
}

/// Creates the row from the leave type's current entitlement
/// (opening = closing = default_entitlement) unless it already exists.
///
/// No locking read comes first: two `FOR UPDATE` misses on the same key both
/// take gap locks and then deadlock on insert. Here the first inserter holds
/// the new record lock and a concurrent caller waits on the duplicate key
/// until it commits. Returns 1 when a row was created, 0 otherwise (existing
/// row or unknown leave type).
pub async fn seed_from_type(
    conn: &mut MySqlConnection,
    employee_id: u64,
    leave_type_id: u64,
    year: i32,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO leave_balances
            (employee_id, leave_type_id, year, opening, accrued, used, adjusted, closing)
        SELECT ?, lt.id, ?, lt.default_entitlement, 0, 0, 0, lt.default_entitlement
        FROM leave_types lt
        WHERE lt.id = ?
        ON DUPLICATE KEY UPDATE leave_balances.id = leave_balances.id
        "#,
    )
    .bind(employee_id)
    .bind(year)
    .bind(leave_type_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn for_employee_year(
    conn: &mut MySqlConnection,
    employee_id: u64,
    year: i32,
) -> Result<Vec<LeaveBalance>, sqlx::Error> {
    let query = format!(
        "SELECT {COLUMNS} FROM leave_balances WHERE employee_id = ? AND year = ? ORDER BY leave_type_id"
    );
    sqlx::query_as::<_, LeaveBalance>(&query)
        .bind(employee_id)
        .bind(year)
        .fetch_all(conn)
        .await
}

pub async fn update_adjustment(
    conn: &mut MySqlConnection,
    balance_id: u64,
    adjusted: Decimal,
    closing: Decimal,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE leave_balances SET adjusted = ?, closing = ?, updated_at = NOW() WHERE id = ?",
    )
    .bind(adjusted)
    .bind(closing)
    .bind(balance_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn update_usage(
    conn: &mut MySqlConnection,
    balance_id: u64,
    used: Decimal,
    closing: Decimal,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE leave_balances SET used = ?, closing = ?, updated_at = NOW() WHERE id = ?",
    )
    .bind(used)
    .bind(closing)
    .bind(balance_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Shifts opening and closing of every row for the type and year by `delta`.
pub async fn shift_entitlement(
    conn: &mut MySqlConnection,
    leave_type_id: u64,
    delta: Decimal,
    year: i32,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE leave_balances
        SET opening = opening + ?,
            closing = closing + ?,
            updated_at = NOW()
        WHERE leave_type_id = ?
        AND year = ?
        "#,
    )
    .bind(delta)
    .bind(delta)
    .bind(leave_type_id)
    .bind(year)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn insert_adjustment(
    conn: &mut MySqlConnection,
    employee_id: u64,
    leave_type_id: u64,
    quantity: Decimal,
    reason: &str,
    created_by: u64,
    year: i32,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO leave_adjustments
            (employee_id, leave_type_id, quantity, reason, created_by, year)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(leave_type_id)
    .bind(quantity)
    .bind(reason)
    .bind(created_by)
    .bind(year)
    .execute(conn)
    .await?;
    Ok(result.last_insert_id())
}

pub async fn adjustments_for_employee_year(
    conn: &mut MySqlConnection,
    employee_id: u64,
    year: i32,
) -> Result<Vec<LeaveAdjustment>, sqlx::Error> {
    sqlx::query_as::<_, LeaveAdjustment>(
        r#"
        SELECT id, employee_id, leave_type_id, quantity, reason, created_by, year, created_at
        FROM leave_adjustments
        WHERE employee_id = ? AND year = ?
        ORDER BY created_at, id
        "#,
    )
    .bind(employee_id)
    .bind(year)
    .fetch_all(conn)
    .await
}
