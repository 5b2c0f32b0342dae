use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::RecentEvents;
use crate::ChangeEvent;
use crate::ChangeHandler;
use crate::ConfigStore;
use crate::RefreshReport;
use crate::CHANGE_EVENTS_RECEIVED;
use crate::DUPLICATE_EVENTS_DROPPED;
use crate::EVENT_APPLY_LATENCY_MS;
use crate::MISSED_EVENTS;

/// Bus handler that refreshes one `ConfigStore`
///
/// Each distinct event is logged once and applied to the store. Failures of
/// individual keys are logged and swallowed; the handler itself never fails.
#[derive(Debug)]
pub struct ChangeNotifier {
    store: Arc<ConfigStore>,
    recent: Mutex<RecentEvents>,
}

impl ChangeNotifier {
    pub fn new(
        store: Arc<ConfigStore>,
        dedup_window: usize,
    ) -> Self {
        Self {
            store,
            recent: Mutex::new(RecentEvents::new(dedup_window)),
        }
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Handles `event` and returns the refresh report.
    ///
    /// Returns `None` when the event id was already handled.
    pub async fn process(
        &self,
        event: &ChangeEvent,
    ) -> Option<RefreshReport> {
        if !self.recent.lock().insert(&event.id) {
            DUPLICATE_EVENTS_DROPPED.inc();
            debug!(event_id = %event.id, "dropping duplicate change event");
            return None;
        }
        CHANGE_EVENTS_RECEIVED.inc();
        let started = Instant::now();

        let report = if event.is_refresh_all() {
            let keys = self.store.known_keys();
            info!(
                event_id = %event.id,
                origin = ?event.origin,
                known_keys = keys.len(),
                "Detected configuration refresh request for all keys"
            );
            self.store.apply_versioned_change(keys, event.version).await
        } else {
            info!(
                event_id = %event.id,
                origin = ?event.origin,
                version = ?event.version,
                "Detected configuration changes: {:?}",
                event.keys
            );
            self.store
                .apply_versioned_change(event.keys.iter().cloned(), event.version)
                .await
        };

        EVENT_APPLY_LATENCY_MS.observe(started.elapsed().as_secs_f64() * 1000.0);
        log_report(&event.id, &report);
        Some(report)
    }

    /// Refreshes every known key; used when events may have been lost.
    pub async fn resync(&self) -> RefreshReport {
        let report = self.store.apply_change(self.store.known_keys()).await;
        log_report("resync", &report);
        report
    }
}

fn log_report(
    event_id: &str,
    report: &RefreshReport,
) {
    for (key, error) in report.failures() {
        warn!(event_id, key, %error, "failed to refresh key, keeping previous value");
    }

    let changed = report.changed_keys();
    if !changed.is_empty() {
        debug!(event_id, ?changed, "configuration refreshed");
    }
}

#[async_trait]
impl ChangeHandler for ChangeNotifier {
    async fn on_change_event(
        &self,
        event: ChangeEvent,
    ) {
        self.process(&event).await;
    }

    async fn on_events_missed(
        &self,
        count: u64,
    ) {
        MISSED_EVENTS.inc_by(count);
        warn!(count, "change events were lost, refreshing all known keys");
        self.resync().await;
    }
}
