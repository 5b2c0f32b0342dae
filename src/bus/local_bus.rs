use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::ChangeEvent;
use super::ChangeHandler;
use crate::BusError;
use crate::Result;

/// In-process broadcast bus
///
/// Every registered handler receives every event published after its
/// registration. A handler that falls more than `capacity` events behind is
/// told how many it missed instead of stalling the publisher.
#[derive(Debug, Clone)]
pub struct LocalBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl LocalBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes `event` to every subscriber and returns how many received it.
    pub fn publish(
        &self,
        event: ChangeEvent,
    ) -> Result<usize> {
        let id = event.id.clone();
        let receivers = self.sender.send(event).map_err(|_| BusError::NoSubscribers)?;
        trace!(event_id = %id, receivers, "event published");
        Ok(receivers)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Attaches `handler` and spawns its dispatch loop.
    ///
    /// The subscription is taken before this returns, so events published
    /// afterwards are never missed. The loop ends on shutdown or when the bus
    /// is dropped.
    pub fn register(
        &self,
        handler: Arc<dyn ChangeHandler>,
        shutdown: watch::Receiver<()>,
    ) -> JoinHandle<()> {
        let receiver = self.subscribe();
        tokio::spawn(dispatch(receiver, handler, shutdown))
    }
}

async fn dispatch(
    mut receiver: broadcast::Receiver<ChangeEvent>,
    handler: Arc<dyn ChangeHandler>,
    mut shutdown: watch::Receiver<()>,
) {
    debug!("bus dispatcher started");

    loop {
        tokio::select! {
            result = receiver.recv() => {
                match result {
                    Ok(event) => handler.on_change_event(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "bus subscriber lagged behind");
                        handler.on_events_missed(skipped).await;
                    }
                    Err(RecvError::Closed) => {
                        warn!("bus channel closed");
                        break;
                    }
                }
            }
            _ = shutdown.changed() => {
                info!("Shutdown signal received, stopping bus dispatcher.");
                break;
            }
        }
    }

    debug!("bus dispatcher stopped");
}
