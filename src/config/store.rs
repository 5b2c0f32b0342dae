use std::collections::HashMap;
use std::path::PathBuf;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use super::server::default_key;
use crate::Error;
use crate::Result;

/// Static defaults and the location of the authoritative configuration
///
/// # Example
/// ```toml
/// [store]
/// source_path = "config/application.toml"
/// env_prefix = "APP"
///
/// [store.defaults]
/// "custom.config.example" = "default-value"
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    /// Fallback values returned when a key has no resolved value
    ///
    /// Keys are kept verbatim (dots are part of the key, not nesting), which is
    /// why the map is not fed back through the layered builder.
    #[serde(default = "default_defaults", skip_serializing)]
    pub defaults: HashMap<String, String>,

    /// Configuration file consulted on every resolution. `None` = environment only.
    #[serde(default)]
    pub source_path: Option<PathBuf>,

    /// Prefix of environment variables overriding file values, `__` separated
    ///
    /// Default: `APP` (`APP__CUSTOM__CONFIG__EXAMPLE` → `custom.config.example`)
    #[serde(default = "default_env_prefix")]
    pub env_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            defaults: default_defaults(),
            source_path: None,
            env_prefix: default_env_prefix(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(key) = self.defaults.keys().find(|k| k.trim().is_empty()) {
            return Err(Error::Config(ConfigError::Message(format!(
                "store.defaults contains an empty key: {key:?}"
            ))));
        }

        if self.env_prefix.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "store.env_prefix cannot be empty".into(),
            )));
        }

        if let Some(path) = &self.source_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config(ConfigError::Message(
                    "store.source_path cannot be empty when set".into(),
                )));
            }
        }

        Ok(())
    }
}

fn default_defaults() -> HashMap<String, String> {
    HashMap::from([(default_key(), "default-value".to_string())])
}
fn default_env_prefix() -> String {
    "APP".to_string()
}
