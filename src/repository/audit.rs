use serde::Serialize;
use sqlx::MySqlConnection;
use strum::{AsRefStr, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Approval,
    Rejection,
    Adjustment,
    Run,
    Finalize,
    Cancel,
    Withdrawal,
}

/// Appends an audit entry on the caller's connection, so it commits or rolls
/// back with the change it describes.
pub async fn record(
    conn: &mut MySqlConnection,
    actor_id: u64,
    action: AuditAction,
    component: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO audit_logs (actor_id, action, component) VALUES (?, ?, ?)")
        .bind(actor_id)
        .bind(action.as_ref())
        .bind(component)
        .execute(conn)
        .await?;
    Ok(())
}
