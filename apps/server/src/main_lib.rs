use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use vnscreen_core::{
    admission::{AdmissionController, AdmissionSettings},
    cache::ResultCache,
    credentials::CredentialRegistry,
    jobs::JobLedger,
    refresh::{RefreshScheduler, RefreshSettings, RefreshWorker},
    screening::{Datastore, ScreeningRecord},
};
use vnscreen_market_data::{HttpProviderConfig, HttpSnapshotProvider, MarketDataProvider};
use vnscreen_storage_sqlite::{db, JobRunRepository, ScreeningRepository};

pub struct AppState {
    pub registry: Arc<CredentialRegistry>,
    pub admission: Arc<AdmissionController>,
    pub cache: Arc<ResultCache<ScreeningRecord>>,
    pub datastore: Arc<dyn Datastore>,
    pub ledger: JobLedger,
    pub scheduler: Arc<RefreshScheduler>,
    pub admin_key: Option<String>,
    pub cache_ttl: Duration,
}

pub fn init_tracing() {
    let log_format = std::env::var("VNS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer(pool.clone());

    let datastore: Arc<dyn Datastore> =
        Arc::new(ScreeningRepository::new(pool.clone(), writer.clone()));
    let ledger = JobLedger::new(Arc::new(JobRunRepository::new(pool, writer)));

    let mut provider_config = HttpProviderConfig::new(config.provider_base_url.clone());
    provider_config.api_key = config.provider_api_key.clone();
    provider_config.request_timeout = config.provider_timeout;
    let provider: Arc<dyn MarketDataProvider> =
        Arc::new(HttpSnapshotProvider::new(provider_config)?);
    tracing::info!("Market data provider: {}", config.provider_base_url);

    let worker = Arc::new(RefreshWorker::new(
        provider,
        datastore.clone(),
        ledger.clone(),
        RefreshSettings {
            fetch_timeout: config.provider_timeout,
        },
    ));
    let scheduler = Arc::new(RefreshScheduler::with_default_jobs(worker, config.market_tz));

    let registry = Arc::new(CredentialRegistry::new());
    let admission = Arc::new(AdmissionController::new(
        registry.clone(),
        AdmissionSettings {
            strict_credentials: config.strict_credentials,
            ..AdmissionSettings::default()
        },
    ));

    if config.admin_key.is_none() {
        tracing::warn!("VNS_ADMIN_KEY is not set; admin routes are disabled");
    }

    Ok(Arc::new(AppState {
        registry,
        admission,
        cache: Arc::new(ResultCache::with_default_ttl(config.cache_ttl)),
        datastore,
        ledger,
        scheduler,
        admin_key: config.admin_key.clone(),
        cache_ttl: config.cache_ttl,
    }))
}
