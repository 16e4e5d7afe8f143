use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use chrono::Utc;
use moka::future::Cache;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::config::{ApiConfig, CacheConfig};
use crate::parameters::ParameterSet;
use crate::store::LedgerStore;

pub const DASHBOARD_KEY: &str = "dashboard";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<LedgerStore>>,
    pub cache: Arc<ApiCache>,
    pub start_time: Instant,
    pub reminders_enabled: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(
        store: Arc<RwLock<LedgerStore>>,
        cache: Arc<ApiCache>,
        reminders_enabled: Arc<AtomicBool>,
    ) -> Self {
        assert!(
            Arc::strong_count(&reminders_enabled) >= 1,
            "Reminder toggle must be shared"
        );
        Self {
            store,
            cache,
            start_time: Instant::now(),
            reminders_enabled,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        let parameters = ParameterSet::with_quorum(config.voting.quorum_percent);
        let store = LedgerStore::new(parameters, config.treasury.opening_balance, Utc::now());
        Self::new(
            Arc::new(RwLock::new(store)),
            Arc::new(ApiCache::new(&config.cache)),
            Arc::new(AtomicBool::new(config.reminders.enabled)),
        )
    }
}

pub struct ApiCache {
    pub summaries: Cache<String, Value>,
}

impl ApiCache {
    pub fn new(config: &CacheConfig) -> Self {
        assert!(
            config.summary_max_capacity >= 1,
            "Summary cache capacity threshold"
        );

        let summaries = Cache::builder()
            .max_capacity(config.summary_max_capacity)
            .time_to_live(Duration::from_secs(config.summary_ttl_seconds))
            .time_to_idle(Duration::from_secs(config.summary_ttl_seconds / 2 + 1))
            .build();

        Self { summaries }
    }

    /// Drops every cached summary after a write to the ledger.
    pub fn invalidate(&self) {
        self.summaries.invalidate_all();
    }
}
