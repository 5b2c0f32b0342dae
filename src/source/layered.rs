use std::path::PathBuf;

use async_trait::async_trait;
use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use tracing::trace;

use super::ConfigSource;
use crate::RefreshError;
use crate::Result;
use crate::StoreConfig;

/// File + environment source, re-read on every resolution
///
/// Priority: the file named by `source_path` (if any), then environment
/// variables `<PREFIX>__A__B__C` which address the dotted key `a.b.c`.
#[derive(Debug, Clone)]
pub struct LayeredSource {
    path: Option<PathBuf>,
    env_prefix: String,
}

impl LayeredSource {
    pub fn new(
        path: Option<PathBuf>,
        env_prefix: impl Into<String>,
    ) -> Self {
        Self {
            path,
            env_prefix: env_prefix.into(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.source_path.clone(), config.env_prefix.clone())
    }

    fn load(&self) -> Result<Config> {
        let mut builder = Config::builder();
        if let Some(path) = &self.path {
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .separator("__")
                .ignore_empty(true),
        );

        builder.build().map_err(|e| RefreshError::Source(e.to_string()).into())
    }

    /// Blocking lookup of one key against a freshly built layer stack
    fn lookup(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        match self.load()?.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(RefreshError::Source(format!("{key}: {e}")).into()),
        }
    }
}

#[async_trait]
impl ConfigSource for LayeredSource {
    async fn resolve(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        let source = self.clone();
        let owned_key = key.to_string();

        let value = tokio::task::spawn_blocking(move || source.lookup(&owned_key))
            .await
            .map_err(|e| RefreshError::Source(format!("resolver task failed: {e}")))??;

        trace!(key, found = value.is_some(), "layered source resolved");
        Ok(value)
    }
}
