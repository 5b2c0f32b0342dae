//! Change event transport.
//!
//! The transport only moves `ChangeEvent`s; what happens on arrival is the
//! business of the registered `ChangeHandler`. `LocalBus` is an in-process
//! broadcast channel. A networked transport plugs into the same handler seam.

mod event;
mod local_bus;

pub use event::*;
pub use local_bus::*;


use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// Receiver side of the bus
///
/// Implementations are invoked from the dispatch task and must return in
/// bounded time; they never report errors back to the transport.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChangeHandler: Send + Sync + 'static {
    async fn on_change_event(
        &self,
        event: ChangeEvent,
    );

    /// The subscription overflowed and `count` events were lost.
    async fn on_events_missed(
        &self,
        count: u64,
    );
}
