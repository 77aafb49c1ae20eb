//! Event bus backed by a tokio broadcast channel.

use gavel_application::ports::event_broadcaster::{
    BroadcastError, EventBroadcaster, GovernanceEvent,
};
use tokio::sync::broadcast;
use tracing::debug;

/// Fan-out of governance events to every live subscriber
///
/// Publishing never blocks. A subscriber that falls more than `capacity`
/// events behind observes a lag on its next receive and skips ahead.
pub struct BroadcastEventBus {
    sender: broadcast::Sender<GovernanceEvent>,
}

impl BroadcastEventBus {
    /// # Panics
    ///
    /// Panics if `capacity` is 0; configuration validation rejects it first.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GovernanceEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventBroadcaster for BroadcastEventBus {
    fn publish(&self, event: GovernanceEvent) -> Result<(), BroadcastError> {
        let name = event.name();
        let receivers = self
            .sender
            .send(event)
            .map_err(|_| BroadcastError::NoSubscribers)?;
        debug!("Broadcast {} to {} subscriber(s)", name, receivers);
        Ok(())
    }
}
