use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// PREVIEW -> FINALIZED, never back.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PayrollStatus {
    Preview,
    Finalized,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PayrollRun {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = 3)]
    pub month: i32,
    #[schema(example = 2025)]
    pub year: i32,
    pub status: PayrollStatus,
}

#[derive(Debug, sqlx::FromRow)]
pub struct PayrollRunRow {
    pub id: u64,
    pub month: i32,
    pub year: i32,
    pub status: String,
}

impl PayrollRunRow {
    /// Decodes the stored status. `None` means a status this service
    /// does not know, which callers treat as an invalid state.
    pub fn parsed_status(&self) -> Option<PayrollStatus> {
        self.status.parse().ok()
    }
}

/// One employee's computed pay for a month, before anything is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PayrollPreview {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "Jane Doe")]
    pub employee_name: String,
    #[schema(example = "22000.00", value_type = String)]
    pub basic_salary: Decimal,
    #[schema(example = 22)]
    pub working_days: i32,
    #[schema(example = "1", value_type = String)]
    pub paid_leaves: Decimal,
    #[schema(example = "2", value_type = String)]
    pub unpaid_leaves: Decimal,
    #[schema(example = "2000.00", value_type = String)]
    pub deduction_amount: Decimal,
    #[schema(example = "20000.00", value_type = String)]
    pub net_salary: Decimal,
}

/// A stored PREVIEW run with the lines computed for it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PayrollRunPreview {
    pub run: PayrollRun,
    pub lines: Vec<PayrollPreview>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FinalizedPayroll {
    pub run: PayrollRun,
    pub payslips: Vec<Payslip>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Payslip {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 7)]
    pub payroll_run_id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "22000.00", value_type = String)]
    pub basic_salary: Decimal,
    #[schema(example = 22)]
    pub working_days: i32,
    #[schema(example = "1", value_type = String)]
    pub paid_leaves: Decimal,
    #[schema(example = "2", value_type = String)]
    pub unpaid_leaves: Decimal,
    #[schema(example = "2000.00", value_type = String)]
    pub deduction_amount: Decimal,
    #[schema(example = "20000.00", value_type = String)]
    pub net_salary: Decimal,
    #[schema(example = "2025-04-01T09:00:00", value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_stored_upper_case() {
        assert_eq!(PayrollStatus::Finalized.as_ref(), "FINALIZED");
        assert_eq!("PREVIEW".parse::<PayrollStatus>().unwrap(), PayrollStatus::Preview);
    }

    #[test]
    fn unknown_stored_status_does_not_parse() {
        let row = PayrollRunRow {
            id: 3,
            month: 1,
            year: 2025,
            status: "OBSOLETE".into(),
        };
        assert!(row.parsed_status().is_none());
    }
}
