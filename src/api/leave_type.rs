use crate::auth::auth::AuthUser;
use crate::service::{self, leave_type::UpdateLeaveType};
use actix_web::{HttpResponse, Responder, web};
use chrono::Datelike;
use sqlx::MySqlPool;

#[utoipa::path(
    get,
    path = "/api/leave-type",
    responses(
        (status = 200, description = "All leave types", body = [LeaveType]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Type"
)]
pub async fn list_leave_types(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let types = service::leave_type::list_leave_types(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(types))
}

/// Changing `default_entitlement` shifts this year's balances by the
/// difference.
#[utoipa::path(
    put,
    path = "/api/leave-type/{id}",
    params(("id" = u64, Path, description = "Leave type id")),
    request_body(content = UpdateLeaveType, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave type updated", body = LeaveType),
        (status = 400, description = "Invalid name or entitlement"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave type not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Type"
)]
pub async fn update_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeaveType>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let year = chrono::Local::now().year();
    let updated = service::leave_type::update_leave_type(
        pool.get_ref(),
        path.into_inner(),
        &payload,
        year,
        auth.user_id,
    )
    .await?;
    Ok(HttpResponse::Ok().json(updated))
}
