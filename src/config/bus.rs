use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Event bus sizing
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BusConfig {
    /// Broadcast buffer per subscriber. A subscriber that falls further behind
    /// loses the oldest events and runs a full refresh.
    ///
    /// Default: 1024
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Number of recent event ids remembered to drop duplicate deliveries.
    /// 0 disables duplicate suppression.
    ///
    /// Default: 256
    #[serde(default = "default_dedup_window")]
    pub dedup_window: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            dedup_window: default_dedup_window(),
        }
    }
}

impl BusConfig {
    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "bus.channel_capacity must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_channel_capacity() -> usize {
    1024
}
fn default_dedup_window() -> usize {
    256
}
