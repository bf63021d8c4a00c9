use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveType {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Annual")]
    pub name: String,

    #[schema(example = true)]
    pub is_paid: bool,

    /// Days granted per year.
    #[schema(example = "18", value_type = String)]
    pub default_entitlement: Decimal,
}
