use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use futures::future::join_all;
use tracing::debug;
use tracing::trace;

use super::ConfigEntry;
use super::ConfigKey;
use super::ConfigValue;
use super::RefreshOutcome;
use super::RefreshReport;
use crate::utils::async_task::task_with_timeout_and_exponential_backoff;
use crate::BackoffPolicy;
use crate::ConfigSource;
use crate::Error;
use crate::Result;
use crate::CONFIG_READS_TOTAL;
use crate::KEY_REFRESH_TOTAL;

type Slot = Arc<ArcSwap<ConfigEntry>>;

/// Per-instance configuration values with lock-free reads
///
/// Every key owns an `ArcSwap` slot. Reads load the slot without blocking;
/// refreshes replace one slot at a time, so a multi-key change never holds a
/// lock across unrelated keys and a reader never sees a partially written value.
pub struct ConfigStore {
    source: Arc<dyn ConfigSource>,
    defaults: HashMap<ConfigKey, ConfigValue>,
    entries: DashMap<ConfigKey, Slot>,
    next_ticket: AtomicU64,
    policy: BackoffPolicy,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("defaults", &self.defaults)
            .field("entries", &self.entries.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ConfigStore {
    pub fn new(
        source: Arc<dyn ConfigSource>,
        defaults: HashMap<ConfigKey, ConfigValue>,
        policy: BackoffPolicy,
    ) -> Self {
        Self {
            source,
            defaults,
            entries: DashMap::new(),
            next_ticket: AtomicU64::new(0),
            policy,
        }
    }

    /// Resolves every key that has a static default.
    ///
    /// Called once at startup; keys that fail keep serving their default.
    pub async fn initialize(&self) -> RefreshReport {
        let keys: Vec<ConfigKey> = self.defaults.keys().cloned().collect();
        self.apply_change(keys).await
    }

    /// Returns the held value of `key`, its default, or `Error::NotFound`.
    pub fn get(
        &self,
        key: &str,
    ) -> Result<ConfigValue> {
        let held = self.entries.get(key).and_then(|slot| slot.load().value.clone());

        if let Some(value) = held {
            CONFIG_READS_TOTAL.with_label_values(&["hit"]).inc();
            return Ok(value);
        }

        match self.defaults.get(key) {
            Some(default) => {
                CONFIG_READS_TOTAL.with_label_values(&["default"]).inc();
                Ok(default.clone())
            }
            None => {
                CONFIG_READS_TOTAL.with_label_values(&["not_found"]).inc();
                Err(Error::NotFound { key: key.to_string() })
            }
        }
    }

    /// Raw slot of `key`, if the key was ever resolved
    pub fn entry(
        &self,
        key: &str,
    ) -> Option<Arc<ConfigEntry>> {
        self.entries.get(key).map(|slot| slot.load_full())
    }

    /// Defaulted keys plus every key the source has defined at some point
    pub fn known_keys(&self) -> BTreeSet<ConfigKey> {
        let mut keys: BTreeSet<ConfigKey> = self.defaults.keys().cloned().collect();
        keys.extend(self.entries.iter().map(|e| e.key().clone()));
        keys
    }

    /// Re-resolves each key from the source and swaps its slot.
    ///
    /// Keys are independent: a failed key keeps its previous value and does not
    /// affect the others.
    pub async fn apply_change<I, K>(
        &self,
        keys: I,
    ) -> RefreshReport
    where
        I: IntoIterator<Item = K>,
        K: Into<ConfigKey>,
    {
        self.apply_versioned_change(keys, None).await
    }

    /// Same as `apply_change`, skipping keys that already applied a newer version.
    pub async fn apply_versioned_change<I, K>(
        &self,
        keys: I,
        version: Option<u64>,
    ) -> RefreshReport
    where
        I: IntoIterator<Item = K>,
        K: Into<ConfigKey>,
    {
        let keys: BTreeSet<ConfigKey> = keys.into_iter().map(Into::into).collect();

        let results = join_all(keys.into_iter().map(|key| self.refresh_key(key, version))).await;

        let mut report = RefreshReport::default();
        for (key, outcome) in results {
            KEY_REFRESH_TOTAL.with_label_values(&[outcome.label()]).inc();
            trace!(%key, outcome = outcome.label(), "key refreshed");
            report.insert(key, outcome);
        }
        report
    }

    async fn refresh_key(
        &self,
        key: ConfigKey,
        version: Option<u64>,
    ) -> (ConfigKey, RefreshOutcome) {
        let applied = self.entries.get(&key).and_then(|slot| slot.load().version);
        if let (Some(incoming), Some(applied)) = (version, applied) {
            if incoming < applied {
                debug!(%key, incoming, applied, "skipping older event version");
                return (key, RefreshOutcome::Stale);
            }
        }

        // Taken before resolving so a slow resolution cannot overwrite a newer one
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        let resolved = task_with_timeout_and_exponential_backoff(
            || {
                let source = Arc::clone(&self.source);
                let key = key.clone();
                async move { source.resolve(&key).await }
            },
            self.policy,
        )
        .await;

        let outcome = match resolved {
            Ok(Some(value)) => commit(&self.slot(&key), ticket, version, Some(value)),
            Ok(None) => match self.entries.get(&key).map(|slot| Arc::clone(slot.value())) {
                Some(slot) => commit(&slot, ticket, version, None),
                None => {
                    trace!(%key, "source does not define key, nothing to store");
                    RefreshOutcome::Unchanged
                }
            },
            Err(e) => {
                debug!(%key, error = %e, "resolution failed, keeping previous value");
                RefreshOutcome::Failed(e)
            }
        };
        (key, outcome)
    }

    /// Slot of `key`, created on first stored value
    fn slot(
        &self,
        key: &str,
    ) -> Slot {
        if let Some(slot) = self.entries.get(key) {
            return Arc::clone(slot.value());
        }
        let slot = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(ArcSwap::from_pointee(ConfigEntry::default())));
        Arc::clone(slot.value())
    }
}

fn commit(
    slot: &ArcSwap<ConfigEntry>,
    ticket: u64,
    version: Option<u64>,
    resolved: Option<ConfigValue>,
) -> RefreshOutcome {
    let mut outcome = RefreshOutcome::Stale;

    slot.rcu(|current| {
        if current.ticket > ticket {
            outcome = RefreshOutcome::Stale;
            return Arc::clone(current);
        }

        let version = match (current.version, version) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        if current.value == resolved {
            outcome = RefreshOutcome::Unchanged;
            return Arc::new(ConfigEntry {
                version,
                ticket,
                ..ConfigEntry::clone(current)
            });
        }

        outcome = if resolved.is_some() {
            RefreshOutcome::Updated
        } else {
            RefreshOutcome::Removed
        };
        Arc::new(ConfigEntry {
            value: resolved.clone(),
            revision: current.revision + 1,
            version,
            ticket,
        })
    });

    outcome
}
