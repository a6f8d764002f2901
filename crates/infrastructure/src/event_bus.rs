//! Event bus - in-process domain event fan-out.
//!
//! Publishes domain events over a tokio broadcast channel so live views
//! (leaderboards, schedules) can subscribe and re-derive instead of polling.
//! Slow subscribers lag and drop rather than back-pressure the publisher.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use contest_application::services::EventPublisher;
use contest_application::ApplicationError;
use contest_domain::events::DomainEvent;

/// Event bus configuration.
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Broadcast channel capacity before the oldest events are dropped.
    pub capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

/// Broadcast-backed event bus.
///
/// Publishing never fails: an event with no live subscribers is dropped,
/// which is the normal state for a headless engine run.
pub struct BroadcastEventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl BroadcastEventBus {
    pub fn new(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.capacity);
        Self { sender }
    }

    /// Subscribe to every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

#[async_trait]
impl EventPublisher for BroadcastEventBus {
    async fn publish(&self, event: DomainEvent) -> Result<(), ApplicationError> {
        debug!(event = event.payload.name(), event_id = %event.id, "Publishing event");
        // send errors only when there are no receivers.
        let _ = self.sender.send(event);
        Ok(())
    }
}
