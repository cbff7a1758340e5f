use std::{sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{MySqlPool, mysql::MySqlPoolOptions};
use tracing::{info, warn};

use crate::config::{Config, StoreBackend};
use crate::store::{Store, memory::MemoryStore, mysql::MySqlStore};

/// Connections are opened on first use, so the server comes up even when
/// MySQL is down and requests answer 503 until it is reachable.
pub fn init_db(database_url: &str) -> anyhow::Result<MySqlPool> {
    MySqlPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(database_url)
        .context("invalid DATABASE_URL")
}

pub async fn init_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Mysql => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;
            let store = MySqlStore::new(init_db(url)?);
            if let Err(e) = store.ensure_schema().await {
                warn!(error = %e, "Database not reachable at start-up, schema deferred");
            }
            info!("Using MySQL store");
            Ok(Arc::new(store))
        }
    }
}
