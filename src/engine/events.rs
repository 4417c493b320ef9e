// ==========================================
// Mission Match Engine - Mission Event Bus
// ==========================================
// Push surface for journal events: one broadcast channel per mission,
// created lazily on first subscribe. Engines publish the events a
// cascade appended, after its transaction commits. Publishing to a
// mission nobody watches is a no-op; a slow subscriber that falls
// behind the channel capacity loses the oldest events (tokio
// broadcast lag semantics), never blocks the publisher.
// ==========================================

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::domain::journal::JournalEvent;

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

pub struct MissionEventBus {
    channels: Mutex<HashMap<String, broadcast::Sender<JournalEvent>>>,
    capacity: usize,
}

impl MissionEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Live feed of journal events for one mission. Events appended
    /// before the call are not replayed; readers wanting history load
    /// the journal first, then subscribe.
    pub fn subscribe(&self, mission_id: &str) -> broadcast::Receiver<JournalEvent> {
        let mut channels = match self.channels.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        channels
            .entry(mission_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Publish one event to its mission channel, if anyone listens.
    pub fn publish(&self, event: &JournalEvent) {
        let channels = match self.channels.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(sender) = channels.get(&event.mission_id) {
            // send only errors when every receiver is gone
            if sender.send(event.clone()).is_err() {
                tracing::trace!(
                    "event bus: no live subscribers: mission_id={}",
                    event.mission_id
                );
            }
        }
    }

    /// Publish a cascade's events in journal order.
    pub fn publish_all(&self, events: &[JournalEvent]) {
        for event in events {
            self.publish(event);
        }
    }
}

impl Default for MissionEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::JournalEventType;

    #[test]
    fn test_subscriber_receives_published_event() {
        let bus = MissionEventBus::new();
        let mut rx = bus.subscribe("m-1");

        let event = JournalEvent::new("m-1", JournalEventType::WaveOpened, "system");
        bus.publish(&event);

        let received = rx.try_recv().unwrap();
        assert_eq!(received.mission_id, "m-1");
        assert_eq!(received.event_type, JournalEventType::WaveOpened);
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let bus = MissionEventBus::new();
        let event = JournalEvent::new("m-unwatched", JournalEventType::MissionCreated, "system");
        bus.publish(&event); // must not panic
    }

    #[test]
    fn test_channels_are_per_mission() {
        let bus = MissionEventBus::new();
        let mut rx_one = bus.subscribe("m-1");
        let mut rx_two = bus.subscribe("m-2");

        bus.publish(&JournalEvent::new("m-1", JournalEventType::WaveOpened, "system"));

        assert!(rx_one.try_recv().is_ok());
        assert!(rx_two.try_recv().is_err());
    }

    #[test]
    fn test_publish_all_preserves_order() {
        let bus = MissionEventBus::new();
        let mut rx = bus.subscribe("m-1");

        let events = vec![
            JournalEvent::new("m-1", JournalEventType::WaveOpened, "system"),
            JournalEvent::new("m-1", JournalEventType::OfferCreated, "system"),
        ];
        bus.publish_all(&events);

        assert_eq!(rx.try_recv().unwrap().event_type, JournalEventType::WaveOpened);
        assert_eq!(rx.try_recv().unwrap().event_type, JournalEventType::OfferCreated);
    }
}
