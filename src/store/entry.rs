use std::collections::BTreeMap;

use crate::Error;

pub type ConfigKey = String;
pub type ConfigValue = String;

/// Snapshot of one key's slot
///
/// Slots are replaced wholesale; a reader holding an `Arc<ConfigEntry>` keeps a
/// consistent view even while the slot is swapped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigEntry {
    /// Resolved value. `None` means the source does not define the key and
    /// reads fall back to the static default.
    pub value: Option<ConfigValue>,

    /// Bumped every time `value` actually changes
    pub revision: u64,

    /// Highest event version applied to this key
    pub version: Option<u64>,

    /// Sequence number of the resolution that produced this slot
    pub(crate) ticket: u64,
}

/// Per-key result of one refresh
#[derive(Debug)]
pub enum RefreshOutcome {
    /// A new value was stored
    Updated,
    /// The source still reports the held value
    Unchanged,
    /// The source no longer defines the key; reads fall back to the default
    Removed,
    /// Skipped: an event with a newer version, or a newer resolution, already
    /// reached this key
    Stale,
    /// Resolution failed; the previous value is kept
    Failed(Error),
}

impl RefreshOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RefreshOutcome::Updated => "updated",
            RefreshOutcome::Unchanged => "unchanged",
            RefreshOutcome::Removed => "removed",
            RefreshOutcome::Stale => "stale",
            RefreshOutcome::Failed(_) => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RefreshOutcome::Failed(_))
    }
}

/// Outcomes of one `apply_change`, keyed by config key
#[derive(Debug, Default)]
pub struct RefreshReport {
    outcomes: BTreeMap<ConfigKey, RefreshOutcome>,
}

impl RefreshReport {
    pub(crate) fn insert(
        &mut self,
        key: ConfigKey,
        outcome: RefreshOutcome,
    ) {
        self.outcomes.insert(key, outcome);
    }

    pub fn outcome(
        &self,
        key: &str,
    ) -> Option<&RefreshOutcome> {
        self.outcomes.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RefreshOutcome)> {
        self.outcomes.iter().map(|(k, o)| (k.as_str(), o))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes.iter().filter_map(|(k, o)| match o {
            RefreshOutcome::Failed(e) => Some((k.as_str(), e)),
            _ => None,
        })
    }

    /// Keys whose readable value changed (updated or removed)
    pub fn changed_keys(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, RefreshOutcome::Updated | RefreshOutcome::Removed))
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn is_success(&self) -> bool {
        !self.outcomes.values().any(RefreshOutcome::is_failure)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
