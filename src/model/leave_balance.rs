use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One ledger row: an employee's balance for one leave type in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveBalance {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub year: i32,
    pub opening: Decimal,
    pub accrued: Decimal,
    pub used: Decimal,
    pub adjusted: Decimal,
    pub closing: Decimal,
}

/// Append-only audit of a manual adjustment.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct LeaveAdjustment {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "-1.5", value_type = String)]
    pub quantity: Decimal,
    #[schema(example = "Carry-over correction")]
    pub reason: String,
    #[schema(example = 2)]
    pub created_by: u64,
    #[schema(example = 2025)]
    pub year: i32,
    #[schema(example = "2025-04-01T09:00:00", value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

/// Balance of one leave type as shown to callers. Types without a ledger row
/// for the year report their default entitlement as opening and closing.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BalanceSnapshot {
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "Annual")]
    pub leave_type: String,
    #[schema(example = "18", value_type = String)]
    pub opening: Decimal,
    #[schema(example = "0", value_type = String)]
    pub accrued: Decimal,
    #[schema(example = "3", value_type = String)]
    pub used: Decimal,
    #[schema(example = "0", value_type = String)]
    pub adjusted: Decimal,
    #[schema(example = "15", value_type = String)]
    pub closing: Decimal,
}

/// Result of a manual adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct AdjustmentOutcome {
    #[schema(example = "2", value_type = String)]
    pub new_adjusted: Decimal,
    #[schema(example = "20", value_type = String)]
    pub new_closing: Decimal,
}
