use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Once;

use async_trait::async_trait;
use confbus::BackoffPolicy;
use confbus::ConfigSource;
use confbus::ConfigStore;
use confbus::MemorySource;
use confbus::RefreshError;
use confbus::Result;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_KEY: &str = "custom.config.example";
pub const DEFAULT_VALUE: &str = "default-value";

static LOGGER_INIT: Once = Once::new();

pub fn enable_logger() {
    LOGGER_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn fast_policy() -> BackoffPolicy {
    BackoffPolicy {
        max_retries: 2,
        timeout_ms: 200,
        base_delay_ms: 1,
        max_delay_ms: 5,
    }
}

pub fn store_over(source: Arc<dyn ConfigSource>) -> Arc<ConfigStore> {
    let defaults = HashMap::from([(DEFAULT_KEY.to_string(), DEFAULT_VALUE.to_string())]);
    Arc::new(ConfigStore::new(source, defaults, fast_policy()))
}

/// Delegates to a `MemorySource` except for one key that never resolves
pub struct BrokenKeySource {
    pub inner: MemorySource,
    pub broken: String,
}

#[async_trait]
impl ConfigSource for BrokenKeySource {
    async fn resolve(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        if key == self.broken {
            return Err(RefreshError::Source(format!("{key} is unavailable")).into());
        }
        self.inner.resolve(key).await
    }
}
