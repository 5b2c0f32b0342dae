use std::collections::BTreeSet;

use nanoid::nanoid;
use serde::Deserialize;
use serde::Serialize;

use crate::ConfigKey;

/// Notification naming keys whose authoritative values changed
///
/// Wire shape: `{ "keys": ["a.b", ...] }`; `id`, `version` and `origin` are
/// optional. An empty `keys` set asks every instance to refresh all keys it knows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Delivery identity used to drop duplicates
    #[serde(default = "new_event_id")]
    pub id: String,

    #[serde(default)]
    pub keys: BTreeSet<ConfigKey>,

    /// Publisher-assigned ordering; events older than the applied version are skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,

    /// Free-form publisher name, for logs only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl ChangeEvent {
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ConfigKey>,
    {
        Self {
            id: new_event_id(),
            keys: keys.into_iter().map(Into::into).collect(),
            version: None,
            origin: None,
        }
    }

    /// Event asking for a refresh of every known key
    pub fn refresh_all() -> Self {
        Self::new(Vec::<ConfigKey>::new())
    }

    pub fn with_version(
        mut self,
        version: u64,
    ) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_origin(
        mut self,
        origin: impl Into<String>,
    ) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn is_refresh_all(&self) -> bool {
        self.keys.is_empty()
    }
}

fn new_event_id() -> String {
    nanoid!()
}
