use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::services::{
    account::AccountService,
    ai::{AiGateway, GeminiGenerator, TextGenerator},
    attendance::AttendanceService,
    audit::AuditRecorder,
    dashboard::DashboardAggregator,
    leave::LeaveService,
};
use crate::store::Store;
use crate::utils::{clock::Clock, email_cache::EmailCache, email_filter::EmailFilter};

/// Everything a handler needs, shared across workers behind `web::Data`.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
    pub email_filter: Arc<EmailFilter>,
    pub email_cache: Arc<EmailCache>,
    pub audit: AuditRecorder,
    pub accounts: AccountService,
    pub attendance: AttendanceService,
    pub leave: LeaveService,
    pub dashboard: DashboardAggregator,
    pub ai: AiGateway,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        let email_filter = Arc::new(EmailFilter::new());
        let email_cache = Arc::new(EmailCache::default());
        let audit = AuditRecorder::new(store.clone(), clock.clone());
        let accounts = AccountService::new(
            store.clone(),
            clock.clone(),
            audit.clone(),
            email_filter.clone(),
            email_cache.clone(),
        );
        let attendance = AttendanceService::new(store.clone(), clock.clone(), audit.clone());
        let leave = LeaveService::new(store.clone(), audit.clone());
        let dashboard = DashboardAggregator::new(store.clone(), clock.clone(), attendance.clone());
        let ai = AiGateway::new(store.clone(), generator);

        Self {
            store,
            clock,
            email_filter,
            email_cache,
            audit,
            accounts,
            attendance,
            leave,
            dashboard,
            ai,
        }
    }

    pub fn from_config(config: &Config, store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self::new(store, clock, text_generator(config))
    }
}

/// The assistant stays disabled when no API key is configured.
fn text_generator(config: &Config) -> Option<Arc<dyn TextGenerator>> {
    let Some(api_key) = config.ai.api_key.as_deref() else {
        warn!("API_KEY not set, AI assistant disabled");
        return None;
    };

    match GeminiGenerator::new(
        &config.ai.base_url,
        &config.ai.model,
        api_key,
        config.ai.timeout,
    ) {
        Ok(generator) => {
            info!(model = %config.ai.model, "AI assistant enabled");
            Some(Arc::new(generator))
        }
        Err(e) => {
            warn!(error = %e, "Failed to build AI client, assistant disabled");
            None
        }
    }
}
