use std::net::SocketAddr;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// HTTP listener and read endpoint settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Network listening address (IP:PORT)
    ///
    /// Default: `default_listen_addr()` (0.0.0.0:8080)
    #[serde(default = "default_listen_addr")]
    pub listen_address: SocketAddr,

    /// Key served by `GET /config` when no key is named
    ///
    /// Default: `custom.config.example`
    #[serde(default = "default_key")]
    pub default_key: String,

    /// Maximum accepted body size of `POST /bus/refresh`, in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_addr(),
            default_key: default_key(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.listen_address.port() == 0 {
            return Err(Error::Config(ConfigError::Message(
                "server.listen_address must name a non-zero port".into(),
            )));
        }

        if self.default_key.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "server.default_key cannot be empty".into(),
            )));
        }

        if self.max_body_bytes == 0 {
            return Err(Error::Config(ConfigError::Message(
                "server.max_body_bytes must be greater than 0".into(),
            )));
        }

        Ok(())
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}
pub(crate) fn default_key() -> String {
    "custom.config.example".to_string()
}
fn default_max_body_bytes() -> u64 {
    16 * 1024
}
