//! Event sinks
//!
//! Committed mutations publish a [`DomainEvent`] wrapped in an
//! [`EventEnvelope`]. Delivery is fire-and-forget: a sink must never fail
//! the mutation that produced the event.

use async_trait::async_trait;
use taskdeck_model::{DomainEvent, EventEnvelope};
use tokio::sync::broadcast;

/// Receives domain events after commit
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one event
    async fn publish(&self, envelope: EventEnvelope);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn publish(&self, _envelope: EventEnvelope) {}
}

/// Fans events out to any number of live subscribers
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: broadcast::Sender<EventEnvelope>,
}

impl ChannelSink {
    /// Create sink buffering up to `capacity` events per subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// New subscriber; sees events published from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn publish(&self, envelope: EventEnvelope) {
        let name = envelope.event.name();
        match self.sender.send(envelope) {
            Ok(receivers) => tracing::trace!("published {} to {} subscribers", name, receivers),
            Err(_) => tracing::trace!("published {} with no subscribers", name),
        }
    }
}

/// Wrap and publish
pub(crate) async fn emit(sink: &dyn EventSink, event: DomainEvent) {
    sink.publish(EventEnvelope::new(event)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_model::{ProjectId, TaskId};

    #[tokio::test]
    async fn channel_delivers_to_subscribers() {
        let sink = ChannelSink::new(8);
        let mut rx = sink.subscribe();

        emit(
            &sink,
            DomainEvent::TaskDeleted {
                project_id: ProjectId(1),
                task_id: TaskId(2),
            },
        )
        .await;

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.event.name(), "task_deleted");
        assert_eq!(envelope.event.project_id(), ProjectId(1));
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_fine() {
        let sink = ChannelSink::new(1);
        assert_eq!(sink.subscriber_count(), 0);
        emit(
            &sink,
            DomainEvent::TaskRestored {
                project_id: ProjectId(1),
                task_id: TaskId(2),
            },
        )
        .await;
    }
}
