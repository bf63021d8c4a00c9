use crate::{
    api::{leave_balance, leave_request, leave_type, payroll},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

/// Per-IP limiter allowing `requests_per_min` with an equal burst.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Every route requires a bearer access token.
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::list_leaves))
                            .route(web::post().to(leave_request::apply_leave)),
                    )
                    // /leave/days
                    .service(
                        web::resource("/days").route(web::post().to(leave_request::leave_days)),
                    )
                    // /leave/admin-add
                    .service(
                        web::resource("/admin-add").route(web::post().to(leave_request::add_leave)),
                    )
                    // /leave/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(leave_request::get_leave))
                            .route(web::put().to(leave_request::update_leave)),
                    )
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    )
                    // /leave/{id}/cancel
                    .service(
                        web::resource("/{id}/cancel")
                            .route(web::put().to(leave_request::cancel_leave)),
                    )
                    // /leave/{id}/withdraw
                    .service(
                        web::resource("/{id}/withdraw")
                            .route(web::put().to(leave_request::withdraw_leave)),
                    ),
            )
            .service(
                web::scope("/leave-balance")
                    // /leave-balance/{employee_id}
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::get().to(leave_balance::get_balance)),
                    )
                    // /leave-balance/{employee_id}/adjust
                    .service(
                        web::resource("/{employee_id}/adjust")
                            .route(web::post().to(leave_balance::adjust_balance)),
                    )
                    // /leave-balance/{employee_id}/adjustments
                    .service(
                        web::resource("/{employee_id}/adjustments")
                            .route(web::get().to(leave_balance::list_adjustments)),
                    ),
            )
            .service(
                web::scope("/leave-type")
                    .service(web::resource("").route(web::get().to(leave_type::list_leave_types)))
                    .service(
                        web::resource("/{id}").route(web::put().to(leave_type::update_leave_type)),
                    ),
            )
            .service(
                web::scope("/payroll")
                    // /payroll/reconcile/{employee_id}
                    .service(
                        web::resource("/reconcile/{employee_id}")
                            .route(web::get().to(payroll::reconcile_month)),
                    )
                    // /payroll/run
                    .service(web::resource("/run").route(web::post().to(payroll::run_payroll)))
                    // /payroll/run/{id}/finalize
                    .service(
                        web::resource("/run/{id}/finalize")
                            .route(web::post().to(payroll::finalize_payroll)),
                    )
                    // /payroll/run/{id}/payslips
                    .service(
                        web::resource("/run/{id}/payslips")
                            .route(web::get().to(payroll::list_payslips)),
                    ),
            ),
    );
}
