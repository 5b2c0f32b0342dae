//! Configuration of the confbus service itself.
//!
//! This is the service's own settings (listen address, bus sizing, refresh
//! policy, static defaults), not the application configuration it serves.
//! Sources are merged with the following priority:
//! 1. Default values as code base
//! 2. Configuration file named by `CONFIG_PATH`
//! 3. Environment variables prefixed with `CONFBUS__` (highest priority)
mod bus;
mod retry;
mod server;
mod store;
pub use bus::*;
pub use retry::*;
pub use server::*;
pub use store::*;
#[cfg(test)]
mod config_test;
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Environment variable prefix for service settings
pub const ENV_PREFIX: &str = "CONFBUS";

/// Main configuration container for the propagation service
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// HTTP listener and read endpoint settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Static defaults and authoritative source location
    #[serde(default)]
    pub store: StoreConfig,
    /// Event bus sizing and duplicate suppression
    #[serde(default)]
    pub bus: BusConfig,
    /// Timeout and retry policy applied to every key resolution
    #[serde(default)]
    pub refresh: BackoffPolicy,
}

impl AppConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// # Note
    /// Validation is deferred so further overrides can be layered with
    /// `with_override_config()`. Callers MUST call `validate()` before use.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("CONFIG_PATH", "config/confbus.toml");
    /// std::env::set_var("CONFBUS__SERVER__PORT", "9000");
    /// let cfg = AppConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.server.validate()?;
        self.store.validate()?;
        self.bus.validate()?;
        self.refresh.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
