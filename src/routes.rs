use std::sync::Arc;

use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{error, web};
use anyhow::Context;

use crate::{
    api::{admin, ai, attendance, employee, export, leave_request, users},
    auth::handlers,
    config::Config,
    error::AppError,
};

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP limiters, built once so every worker shares the same buckets.
#[derive(Clone)]
pub struct RateLimits {
    login: Limiter,
    signup: Limiter,
}

impl RateLimits {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            login: Arc::new(build_limiter(config.rate_login_per_min)?),
            signup: Arc::new(build_limiter(config.rate_signup_per_min)?),
        })
    }
}

// Helper to build per-route limiter
fn build_limiter(
    requests_per_min: u32,
) -> anyhow::Result<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(60_000 / requests_per_min as u64)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .context("invalid rate limit configuration")?;
    Ok(Governor::new(&cfg))
}

fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            AppError::InvalidInput(format!("Invalid request body: {err}")).into()
        })
}

fn path_config(message: &'static str) -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(move |_err, _req| error::Error::from(AppError::InvalidInput(message.into())))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limits: &RateLimits) {
    cfg.app_data(json_config(config.json_limit_bytes));

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/auth")
                    .service(
                        web::resource("/login")
                            .wrap(limits.login.clone())
                            .route(web::post().to(handlers::login)),
                    )
                    .service(
                        web::resource("/signup")
                            .wrap(limits.signup.clone())
                            .route(web::post().to(handlers::signup)),
                    ),
            )
            .service(
                web::scope("/users")
                    .app_data(path_config("Invalid user ID."))
                    // /users/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(users::get_user))
                            .route(web::put().to(users::update_user)),
                    ),
            )
            .service(
                web::scope("/admin")
                    .app_data(path_config("Invalid request ID."))
                    .route("/dashboard-data", web::get().to(admin::dashboard_data))
                    .route("/employees", web::get().to(admin::list_employees))
                    .route("/attendance", web::get().to(admin::list_attendance))
                    .route("/salaries", web::get().to(admin::list_salaries))
                    .service(
                        web::resource("/gamification-settings")
                            .route(web::get().to(admin::get_gamification_settings))
                            .route(web::put().to(admin::update_gamification_settings)),
                    )
                    .route("/audit-logs", web::get().to(admin::audit_logs))
                    .route("/export/employees", web::get().to(export::export_employees))
                    .route("/leave-requests", web::get().to(leave_request::admin_leave_list))
                    // /admin/leave-requests/{id}
                    .route(
                        "/leave-requests/{id}",
                        web::put().to(leave_request::decide_leave),
                    ),
            )
            .service(
                web::scope("/employees/{id}")
                    .app_data(path_config("Invalid user ID."))
                    .route("/dashboard-data", web::get().to(employee::dashboard_data))
                    .service(
                        web::resource("/attendance")
                            .route(web::get().to(attendance::list_attendance))
                            .route(web::post().to(attendance::mark_attendance)),
                    )
                    .route("/salaries", web::get().to(employee::list_salaries))
                    .service(
                        web::resource("/leave-requests")
                            .route(web::get().to(leave_request::employee_leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    ),
            )
            .route("/ai/chat", web::post().to(ai::chat)),
    );
}
