use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::service::{self, payroll::RunPayroll};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReconcileQuery {
    /// Payroll month, 1-12
    #[schema(example = 3)]
    pub month: i32,
    #[schema(example = 2025)]
    pub year: i32,
}

/* =========================
Reconcile one employee's month
========================= */
#[utoipa::path(
    get,
    path = "/api/payroll/reconcile/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        ReconcileQuery
    ),
    responses(
        (status = 200, description = "Paid and unpaid leave days in the month", body = MonthlyLeaveSummary),
        (status = 400, description = "Month out of range"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn reconcile_month(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<ReconcileQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let summary = service::reconciler::reconcile_month(
        pool.get_ref(),
        path.into_inner(),
        query.month,
        query.year,
    )
    .await?;
    Ok(HttpResponse::Ok().json(summary))
}

/* =========================
Run payroll preview
========================= */
#[utoipa::path(
    post,
    path = "/api/payroll/run",
    request_body(content = RunPayroll, content_type = "application/json"),
    responses(
        (status = 201, description = "Preview run stored", body = PayrollRunPreview),
        (status = 400, description = "Month out of range or not yet elapsed"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Month already finalized")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn run_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<RunPayroll>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let today = chrono::Local::now().date_naive();
    let preview = service::payroll::run_preview(
        pool.get_ref(),
        payload.into_inner(),
        auth.user_id,
        config.default_working_days_per_month,
        today,
    )
    .await?;
    Ok(HttpResponse::Created().json(preview))
}

/* =========================
Finalize payroll run
========================= */
#[utoipa::path(
    post,
    path = "/api/payroll/run/{run_id}/finalize",
    params(("run_id" = u64, Path, description = "Payroll run id")),
    responses(
        (status = 200, description = "Run finalized and payslips written", body = FinalizedPayroll),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Payroll run not found"),
        (status = 409, description = "Already finalized or invalid state")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn finalize_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let finalized = service::payroll::finalize(
        pool.get_ref(),
        path.into_inner(),
        auth.user_id,
        config.default_working_days_per_month,
    )
    .await?;
    Ok(HttpResponse::Ok().json(finalized))
}

/* =========================
List payslips of a run
========================= */
#[utoipa::path(
    get,
    path = "/api/payroll/run/{run_id}/payslips",
    params(("run_id" = u64, Path, description = "Payroll run id")),
    responses(
        (status = 200, description = "Payslips of the run", body = [Payslip]),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Payroll run not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payslips(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let payslips = service::payroll::payslips(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(payslips))
}
