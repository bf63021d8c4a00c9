use rust_decimal::Decimal;
use sqlx::MySqlConnection;

use crate::model::leave_type::LeaveType;

pub async fn list(conn: &mut MySqlConnection) -> Result<Vec<LeaveType>, sqlx::Error> {
    sqlx::query_as::<_, LeaveType>(
        "SELECT id, name, is_paid, default_entitlement FROM leave_types ORDER BY id",
    )
    .fetch_all(conn)
    .await
}

pub async fn find(
    conn: &mut MySqlConnection,
    leave_type_id: u64,
) -> Result<Option<LeaveType>, sqlx::Error> {
    sqlx::query_as::<_, LeaveType>(
        "SELECT id, name, is_paid, default_entitlement FROM leave_types WHERE id = ?",
    )
    .bind(leave_type_id)
    .fetch_optional(conn)
    .await
}

/// Locks the leave type so concurrent policy edits see each other's
/// entitlement.
pub async fn find_for_update(
    conn: &mut MySqlConnection,
    leave_type_id: u64,
) -> Result<Option<LeaveType>, sqlx::Error> {
    sqlx::query_as::<_, LeaveType>(
        "SELECT id, name, is_paid, default_entitlement FROM leave_types WHERE id = ? FOR UPDATE",
    )
    .bind(leave_type_id)
    .fetch_optional(conn)
    .await
}

pub async fn update(
    conn: &mut MySqlConnection,
    leave_type_id: u64,
    name: &str,
    is_paid: bool,
    default_entitlement: Decimal,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE leave_types
        SET name = ?, is_paid = ?, default_entitlement = ?, updated_at = NOW()
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(is_paid)
    .bind(default_entitlement)
    .bind(leave_type_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
