use crate::api::leave_balance::YearQuery;
use crate::api::leave_request::{
    LeaveDaysRequest, LeaveDaysResponse, LeaveMonthQuery, WithdrawLeaveRequest,
};
use crate::api::payroll::ReconcileQuery;
use crate::model::leave_balance::{AdjustmentOutcome, BalanceSnapshot, LeaveAdjustment};
use crate::model::leave_request::{Leave, LeaveListing, LeaveStatus, LeaveTiming};
use crate::model::leave_type::LeaveType;
use crate::model::payroll::{
    FinalizedPayroll, PayrollPreview, PayrollRun, PayrollRunPreview, PayrollStatus, Payslip,
};
use crate::service::leave::{LeaveInput, LeaveOnBehalf};
use crate::service::leave_type::UpdateLeaveType;
use crate::service::ledger::AdjustBalance;
use crate::service::payroll::RunPayroll;
use crate::service::reconciler::MonthlyLeaveSummary;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Leave & Payroll API",
        version = "1.0.0",
        description = r#"
## Leave balances and payroll deductions

- **Leave**: compute working days for a span, apply or add on behalf, edit while pending,
  approve, reject, cancel, withdraw, month listings scoped by role
- **Leave balances**: yearly ledger per employee and leave type, manual adjustments
- **Leave types**: entitlement policy, propagated to the current year's balances
- **Payroll**: monthly reconciliation, PREVIEW runs and FINALIZED payslips

Every endpoint needs a **JWT Bearer** access token. Errors are returned as
`{"error": {"kind": "...", "message": "..."}}`.
"#,
    ),
    paths(
        crate::api::leave_request::leave_days,
        crate::api::leave_request::apply_leave,
        crate::api::leave_request::update_leave,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::list_leaves,
        crate::api::leave_request::add_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::withdraw_leave,

        crate::api::leave_balance::get_balance,
        crate::api::leave_balance::adjust_balance,
        crate::api::leave_balance::list_adjustments,

        crate::api::leave_type::list_leave_types,
        crate::api::leave_type::update_leave_type,

        crate::api::payroll::reconcile_month,
        crate::api::payroll::run_payroll,
        crate::api::payroll::finalize_payroll,
        crate::api::payroll::list_payslips
    ),
    components(
        schemas(
            LeaveDaysRequest,
            LeaveDaysResponse,
            LeaveInput,
            LeaveOnBehalf,
            LeaveMonthQuery,
            WithdrawLeaveRequest,
            Leave,
            LeaveListing,
            LeaveStatus,
            LeaveTiming,
            BalanceSnapshot,
            AdjustBalance,
            AdjustmentOutcome,
            LeaveAdjustment,
            YearQuery,
            LeaveType,
            UpdateLeaveType,
            ReconcileQuery,
            MonthlyLeaveSummary,
            RunPayroll,
            PayrollRun,
            PayrollStatus,
            PayrollPreview,
            PayrollRunPreview,
            FinalizedPayroll,
            Payslip
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request APIs"),
        (name = "Leave Balance", description = "Leave ledger APIs"),
        (name = "Leave Type", description = "Leave policy APIs"),
        (name = "Payroll", description = "Payroll run APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_response_body_has_a_registered_schema() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().unwrap().schemas;
        for name in [
            "Leave",
            "LeaveListing",
            "LeaveOnBehalf",
            "BalanceSnapshot",
            "AdjustmentOutcome",
            "LeaveAdjustment",
            "LeaveType",
            "MonthlyLeaveSummary",
            "PayrollRunPreview",
            "FinalizedPayroll",
            "Payslip",
        ] {
            assert!(schemas.contains_key(name), "missing schema {name}");
        }
        for path in ["/api/leave", "/api/leave/admin-add", "/api/leave/{id}/withdraw"] {
            assert!(doc.paths.paths.contains_key(path), "missing path {path}");
        }
    }
}
