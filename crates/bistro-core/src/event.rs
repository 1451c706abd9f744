//! Event bus for bistro using tokio::broadcast
//!
//! Every store mutation publishes an event keyed by entity type; consumers
//! react by taking a fresh snapshot and recomputing their reports.

use tokio::sync::broadcast;
use tracing::trace;

/// Kind of change applied to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// Events emitted by the data layer
#[derive(Debug, Clone)]
pub enum DataEvent {
    /// An order was inserted, had its status changed, or was deleted
    OrderChanged { id: String, change: ChangeKind },
    /// A menu item was inserted, edited, or deleted
    MenuItemChanged { id: String, change: ChangeKind },
    /// Store contents were replaced from the data file
    DataReloaded,
    /// Initial load completed
    LoadCompleted,
    /// Watcher encountered an error
    WatcherError(String),
}

impl DataEvent {
    /// True when cached reports computed before this event are stale
    pub fn invalidates_reports(&self) -> bool {
        !matches!(self, DataEvent::WatcherError(_))
    }
}

/// Broadcast channel for data events (tokio::broadcast, multi-consumer)
///
/// Slow receivers lag rather than block publishers; a lagged consumer
/// recomputes from a fresh snapshot.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DataEvent>,
}

impl EventBus {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Send to every current subscriber, returns how many received it
    pub fn publish(&self, event: DataEvent) -> usize {
        trace!(?event, "Publishing data event");
        // Err only means nobody is listening
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DataEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(DataEvent::OrderChanged {
            id: "o-1".to_string(),
            change: ChangeKind::Inserted,
        });
        bus.publish(DataEvent::MenuItemChanged {
            id: "m-1".to_string(),
            change: ChangeKind::Deleted,
        });

        let event1 = rx.recv().await.unwrap();
        assert!(matches!(
            event1,
            DataEvent::OrderChanged { ref id, change: ChangeKind::Inserted } if id == "o-1"
        ));

        let event2 = rx.recv().await.unwrap();
        assert!(matches!(
            event2,
            DataEvent::MenuItemChanged { change: ChangeKind::Deleted, .. }
        ));
    }

    #[tokio::test]
    async fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        assert_eq!(bus.publish(DataEvent::DataReloaded), 2);

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();

        assert!(matches!(e1, DataEvent::DataReloaded));
        assert!(matches!(e2, DataEvent::DataReloaded));
    }

    #[test]
    fn test_event_bus_no_subscribers_ok() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(DataEvent::LoadCompleted), 0);
    }

    #[test]
    fn test_watcher_error_keeps_reports() {
        assert!(!DataEvent::WatcherError("boom".to_string()).invalidates_reports());
        assert!(DataEvent::DataReloaded.invalidates_reports());
    }
}
