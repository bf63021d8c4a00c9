use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::service::{self, ledger::AdjustBalance};
use actix_web::{HttpResponse, Responder, web};
use chrono::Datelike;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct YearQuery {
    /// Defaults to the current year
    #[schema(example = 2025)]
    pub year: Option<i32>,
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

fn ensure_visible(auth: &AuthUser, employee_id: u64) -> Result<(), AppError> {
    if auth.can_view_employee(employee_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not your leave balance".into()))
    }
}

/* =========================
Balance snapshot
========================= */
#[utoipa::path(
    get,
    path = "/api/leave-balance/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        YearQuery
    ),
    responses(
        (status = 200, description = "One entry per leave type", body = [BalanceSnapshot]),
        (status = 403, description = "Not your leave balance")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Balance"
)]
pub async fn get_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<YearQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    ensure_visible(&auth, employee_id)?;
    let year = query.year.unwrap_or_else(current_year);
    let snapshot = service::ledger::balance_snapshot(pool.get_ref(), employee_id, year).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

/* =========================
Manual adjustment
========================= */
#[utoipa::path(
    post,
    path = "/api/leave-balance/{employee_id}/adjust",
    params(("employee_id" = u64, Path, description = "Employee id")),
    request_body(content = AdjustBalance, content_type = "application/json"),
    responses(
        (status = 200, description = "Balance adjusted", body = AdjustmentOutcome),
        (status = 400, description = "Zero quantity or missing reason"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee or leave type not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Balance"
)]
pub async fn adjust_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<AdjustBalance>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let year = payload.year.unwrap_or_else(current_year);
    let outcome = service::ledger::adjust_balance(
        pool.get_ref(),
        path.into_inner(),
        &payload,
        year,
        auth.user_id,
    )
    .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/* =========================
Adjustment history
========================= */
#[utoipa::path(
    get,
    path = "/api/leave-balance/{employee_id}/adjustments",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        YearQuery
    ),
    responses(
        (status = 200, description = "Manual adjustments, oldest first", body = [LeaveAdjustment]),
        (status = 403, description = "Not your leave balance")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Balance"
)]
pub async fn list_adjustments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<YearQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    ensure_visible(&auth, employee_id)?;
    let year = query.year.unwrap_or_else(current_year);
    let history = service::ledger::adjustment_history(pool.get_ref(), employee_id, year).await?;
    Ok(HttpResponse::Ok().json(history))
}
