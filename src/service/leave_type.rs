use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::leave_type::LeaveType;
use crate::repository::{self, audit::AuditAction};
use crate::service::ledger;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLeaveType {
    #[schema(example = "Annual")]
    pub name: String,
    #[schema(example = true)]
    pub is_paid: bool,
    #[schema(example = "20", value_type = String)]
    pub default_entitlement: Decimal,
}

fn validate(input: &UpdateLeaveType) -> AppResult<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    if input.default_entitlement < Decimal::ZERO {
        return Err(AppError::Validation(
            "default_entitlement must not be negative".into(),
        ));
    }
    Ok(())
}

pub async fn list_leave_types(pool: &MySqlPool) -> AppResult<Vec<LeaveType>> {
    let mut conn = pool.acquire().await?;
    Ok(repository::leave_type::list(&mut conn).await?)
}

/// Edits a leave type and re-bases `year`'s balances on the new entitlement
/// in the same transaction.
pub async fn update_leave_type(
    pool: &MySqlPool,
    leave_type_id: u64,
    input: &UpdateLeaveType,
    year: i32,
    actor_id: u64,
) -> AppResult<LeaveType> {
    validate(input)?;
    let name = input.name.trim();

    let mut tx = pool.begin().await?;

    let current = repository::leave_type::find_for_update(&mut *tx, leave_type_id)
        .await?
        .ok_or_else(|| AppError::not_found("leave type"))?;

    repository::leave_type::update(
        &mut *tx,
        leave_type_id,
        name,
        input.is_paid,
        input.default_entitlement,
    )
    .await?;

    let shifted = ledger::propagate_entitlement_change(
        &mut *tx,
        leave_type_id,
        current.default_entitlement,
        input.default_entitlement,
        year,
    )
    .await?;

    repository::audit::record(&mut *tx, actor_id, AuditAction::Update, "leave_type").await?;
    tx.commit().await?;

    info!(leave_type_id, balances = shifted, "Leave type updated");
    Ok(LeaveType {
        id: leave_type_id,
        name: name.to_string(),
        is_paid: input.is_paid,
        default_entitlement: input.default_entitlement,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_entitlement_is_rejected() {
        let input = UpdateLeaveType {
            name: "Annual".into(),
            is_paid: true,
            default_entitlement: Decimal::new(-1, 0),
        };
        assert_eq!(validate(&input).unwrap_err().kind(), "validation");
    }

    #[test]
    fn blank_name_is_rejected() {
        let input = UpdateLeaveType {
            name: " ".into(),
            is_paid: false,
            default_entitlement: Decimal::ZERO,
        };
        assert!(validate(&input).is_err());
    }
}
