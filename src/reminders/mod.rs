use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, watch};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::RemindersConfig;
use crate::state::ApiCache;
use crate::store::LedgerStore;

/// Background loop re-sending unanswered notifications and rendering
/// queued reports.
pub struct ReminderWorker {
    store: Arc<RwLock<LedgerStore>>,
    config: RemindersConfig,
    enabled: Arc<AtomicBool>,
    cache: Arc<ApiCache>,
}

impl ReminderWorker {
    pub fn new(
        store: Arc<RwLock<LedgerStore>>,
        config: RemindersConfig,
        enabled: Arc<AtomicBool>,
        cache: Arc<ApiCache>,
    ) -> Self {
        assert!(
            config.poll_interval_ms >= 100,
            "Reminder poll interval must be at least 100ms"
        );
        Self {
            store,
            config,
            enabled,
            cache,
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!("Starting reminder loop");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    match changed {
                        Ok(_) => {
                            if *shutdown.borrow() {
                                info!("Reminder shutdown signal received");
                                break;
                            }
                        }
                        Err(_) => {
                            warn!("Shutdown channel closed unexpectedly. Exiting reminder loop");
                            break;
                        }
                    }
                }
                _ = sleep(self.config.poll_interval()) => {
                    self.tick(Utc::now()).await;
                }
            }
        }

        Ok(())
    }

    /// Renders queued reports, then sweeps reminders. The sweep is skipped
    /// while the runtime toggle or the `auto_notifications` parameter is off.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickOutcome {
        let mut store = self.store.write().await;
        let reports = store.complete_reports(now);

        let reminded = if !self.enabled.load(AtomicOrdering::SeqCst) {
            debug!("Reminders disabled; skipping sweep");
            Vec::new()
        } else if !store.auto_notifications() {
            debug!("Automatic notifications off; skipping sweep");
            Vec::new()
        } else {
            store.sweep_reminders(self.config.policy(), now)
        };
        drop(store);

        if !reports.is_empty() {
            info!("Rendered {} queued reports", reports.len());
        }
        if !reminded.is_empty() {
            info!("Re-sent {} pending notifications", reminded.len());
        }
        if !reports.is_empty() || !reminded.is_empty() {
            self.cache.invalidate();
        }
        TickOutcome { reminded, reports }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub reminded: Vec<i64>,
    pub reports: Vec<i64>,
}
