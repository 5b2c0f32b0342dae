use async_trait::async_trait;
use dashmap::DashMap;

use super::ConfigSource;
use crate::Result;

/// In-memory source for embedding and tests
#[derive(Debug, Default)]
pub struct MemorySource {
    values: DashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let source = Self::new();
        for (k, v) in values {
            source.set(k, v);
        }
        source
    }

    /// Sets the authoritative value. Instances see it only after a change event.
    pub fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(
        &self,
        key: &str,
    ) -> Option<String> {
        self.values.remove(key).map(|(_, v)| v)
    }
}

#[async_trait]
impl ConfigSource for MemorySource {
    async fn resolve(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        Ok(self.values.get(key).map(|v| v.value().clone()))
    }
}
