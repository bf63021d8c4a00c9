use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::leave_request::LeaveTiming;
use crate::service::{
    self,
    leave::{LeaveInput, LeaveOnBehalf},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct LeaveDaysRequest {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// `first-half`, `second-half` or `full-day` (default)
    #[schema(example = "first-half")]
    pub timing: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveMonthQuery {
    /// Listing starts at the first day of this month, 1-12
    #[schema(example = 3)]
    pub month: i32,
    #[schema(example = 2025)]
    pub year: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct WithdrawLeaveRequest {
    #[schema(example = "Project deadline moved")]
    pub reason: String,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveDaysResponse {
    #[schema(example = "2.5", value_type = String)]
    pub days: Decimal,
    pub timing: LeaveTiming,
}

/* =========================
Compute leave days
========================= */
#[utoipa::path(
    post,
    path = "/api/leave/days",
    request_body(content = LeaveDaysRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Working days covered by the span", body = LeaveDaysResponse),
        (status = 400, description = "End before start, or unknown timing"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_days(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<LeaveDaysRequest>,
) -> actix_web::Result<impl Responder> {
    let timing = payload
        .timing
        .as_deref()
        .map(LeaveTiming::parse)
        .transpose()?
        .unwrap_or_default();

    let days = service::span::compute_leave_days(
        pool.get_ref(),
        payload.start_date,
        payload.end_date,
        timing,
    )
    .await?;

    Ok(HttpResponse::Ok().json(LeaveDaysResponse { days, timing }))
}

/* =========================
Apply for leave
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(content = LeaveInput, content_type = "application/json"),
    responses(
        (status = 201, description = "Leave request submitted", body = Leave),
        (status = 400, description = "Invalid dates, timing, zero working days or overlap"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 422, description = "Insufficient leave balance")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn apply_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<LeaveInput>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_profile()?;
    let leave =
        service::leave::apply_leave(pool.get_ref(), employee_id, auth.user_id, &payload).await?;
    Ok(HttpResponse::Created().json(leave))
}

/* =========================
Edit a pending leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{id}",
    params(("id" = u64, Path, description = "Leave request id")),
    request_body(content = LeaveInput, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave request updated", body = Leave),
        (status = 400, description = "Invalid input or leave is not pending"),
        (status = 403, description = "Not the requester"),
        (status = 404, description = "Leave not found"),
        (status = 422, description = "Insufficient leave balance")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn update_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<LeaveInput>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_profile()?;
    let leave = service::leave::update_pending_leave(
        pool.get_ref(),
        path.into_inner(),
        employee_id,
        auth.user_id,
        &payload,
    )
    .await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Get single leave
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/{id}",
    params(("id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave request", body = Leave),
        (status = 403, description = "Not your leave"),
        (status = 404, description = "Leave not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave = service::leave::get_leave(pool.get_ref(), path.into_inner()).await?;
    if !auth.can_view_employee(leave.employee_id) {
        return Err(AppError::Forbidden("Not your leave".into()).into());
    }
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Approve leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{id}/approve",
    params(("id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave approved", body = Leave),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Leave is not pending"),
        (status = 422, description = "Insufficient leave balance")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let leave =
        service::leave::approve_leave(pool.get_ref(), path.into_inner(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Reject leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{id}/reject",
    params(("id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave rejected", body = Leave),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Leave is not pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let leave =
        service::leave::reject_leave(pool.get_ref(), path.into_inner(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
List leaves from a month on
========================= */
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveMonthQuery),
    responses(
        (status = 200, description = "Own leaves, a manager's team, or everyone's for HR/Admin", body = [LeaveListing]),
        (status = 400, description = "Month out of range"),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn list_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveMonthQuery>,
) -> actix_web::Result<impl Responder> {
    let scope = auth.leave_scope()?;
    let leaves =
        service::leave::list_leaves(pool.get_ref(), scope, query.month, query.year).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

/* =========================
Add leave for an employee
========================= */
#[utoipa::path(
    post,
    path = "/api/leave/admin-add",
    request_body(content = LeaveOnBehalf, content_type = "application/json"),
    responses(
        (status = 201, description = "Leave recorded as approved", body = Leave),
        (status = 400, description = "Invalid dates, timing, zero working days or overlap"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee or leave type not found"),
        (status = 422, description = "Insufficient leave balance")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn add_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<LeaveOnBehalf>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let leave = service::leave::add_leave_for(pool.get_ref(), &payload, auth.user_id).await?;
    Ok(HttpResponse::Created().json(leave))
}

/* =========================
Cancel a pending leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{id}/cancel",
    params(("id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave cancelled", body = Leave),
        (status = 403, description = "Not the requester"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Leave is not pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    // HR and admins may cancel anyone's pending leave.
    let owner = if auth.role.can_manage_leave() {
        None
    } else {
        Some(auth.require_employee_profile()?)
    };
    let leave =
        service::leave::cancel_leave(pool.get_ref(), path.into_inner(), owner, auth.user_id)
            .await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Withdraw an approved leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{id}/withdraw",
    params(("id" = u64, Path, description = "Leave request id")),
    request_body(content = WithdrawLeaveRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave withdrawn, charged days credited back", body = Leave),
        (status = 400, description = "Missing reason"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Leave is not approved, or its payroll month is finalized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn withdraw_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<WithdrawLeaveRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let leave = service::leave::withdraw_leave(
        pool.get_ref(),
        path.into_inner(),
        &payload.reason,
        auth.user_id,
    )
    .await?;
    Ok(HttpResponse::Ok().json(leave))
}
