use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod routes;
mod services;
mod state;
mod store;
mod utils;

use config::Config;
use db::init_store;
use routes::RateLimits;
use state::AppState;
use store::seed::{seed_if_empty, seed_when_reachable};
use utils::clock::{Clock, SystemClock};

use crate::docs::ApiDoc;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

const SEED_RETRY: Duration = Duration::from_secs(10);

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(backend = %config.store_backend, "Server starting...");

    let store = init_store(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.attendance_offset));

    if config.seed_data {
        match seed_if_empty(store.as_ref(), clock.today()).await {
            Ok(true) => info!("Seeded demo data"),
            Ok(false) => {}
            // the database may still be starting; seed once it answers
            Err(e) => {
                warn!(error = %e, "Seeding deferred");
                let (store, clock) = (store.clone(), clock.clone());
                actix_web::rt::spawn(async move {
                    match seed_when_reachable(store.as_ref(), clock.as_ref(), SEED_RETRY).await {
                        Ok(true) => info!("Seeded demo data"),
                        Ok(false) => {}
                        Err(e) => error!(error = %e, "Seeding failed"),
                    }
                });
            }
        }
    }

    let state = Data::new(AppState::from_config(&config, store, clock));
    let limits = RateLimits::from_config(&config)?;

    let filter_state = state.clone();
    actix_web::rt::spawn(async move {
        let s = filter_state.get_ref();
        if let Err(e) = s.email_filter.warmup(s.store.as_ref(), 100).await {
            error!(error = %e, "Failed to warmup email filter");
        }
    });

    let cache_state = state.clone();
    actix_web::rt::spawn(async move {
        // Warm up accounts joined in the last 30 days, in batches of 250
        let s = cache_state.get_ref();
        let today = s.clock.today();
        if let Err(e) = s.email_cache.warmup(s.store.as_ref(), today, 30, 250).await {
            error!(error = %e, "Failed to warmup email cache");
        }
    });

    let server_addr = config.server_addr.clone();
    info!(addr = %server_addr, prefix = %config.api_prefix, "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state.clone())
            .configure(|cfg| routes::configure(cfg, &config, &limits))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
