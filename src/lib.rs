//! # confbus
//!
//! Dynamic configuration propagation across application instances over a
//! shared event bus.
//!
//! An external actor publishes a [`ChangeEvent`] naming the keys that changed.
//! Every instance's [`ChangeNotifier`] logs the event once and asks its
//! [`ConfigStore`] to re-resolve those keys from the authoritative
//! [`ConfigSource`]. Reads are served from per-key atomic slots and never
//! observe a partially written value.
//!
//! Components are wired explicitly:
//!
//! ```ignore
//! let store = Arc::new(ConfigStore::new(source, defaults, policy));
//! let notifier = Arc::new(ChangeNotifier::new(store.clone(), 256));
//! let bus = LocalBus::new(1024);
//! let dispatcher = bus.register(notifier, shutdown_rx);
//! bus.publish(ChangeEvent::new(["custom.config.example"]))?;
//! ```

pub mod api;
mod bus;
mod config;
mod errors;
mod metrics;
mod notifier;
mod source;
mod store;
mod utils;

pub use bus::*;
pub use self::config::*;
pub use errors::*;
pub use metrics::*;
pub use notifier::*;
pub use source::*;
pub use store::*;
