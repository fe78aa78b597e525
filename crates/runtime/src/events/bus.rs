//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use arbiter_core::Notice;

use super::types::{CooldownEvent, LedgerEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Messages addressed to actors (denials, consumption, penalties)
    Notice,
    /// Cooldown writes, for read replicas
    Cooldown,
    /// Reservation and resolution bookkeeping
    Ledger,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Notice(Notice),
    Cooldown(CooldownEvent),
    Ledger(LedgerEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Notice(_) => Topic::Notice,
            Event::Cooldown(_) => Topic::Cooldown,
            Event::Ledger(_) => Topic::Ledger,
        }
    }
}

/// Topic-based event bus
///
/// One broadcast channel per topic, created up front. Cloning shares the
/// channels. Publishing never blocks; with no subscribers the event is
/// dropped.
#[derive(Clone)]
pub struct EventBus {
    notice: broadcast::Sender<Event>,
    cooldown: broadcast::Sender<Event>,
    ledger: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            notice: broadcast::channel(capacity).0,
            cooldown: broadcast::channel(capacity).0,
            ledger: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Notice => &self.notice,
            Topic::Cooldown => &self.cooldown,
            Topic::Ledger => &self.ledger,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> Vec<(Topic, broadcast::Receiver<Event>)> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.sender(topic).receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("notice_subscribers", &self.notice.receiver_count())
            .field("cooldown_subscribers", &self.cooldown.receiver_count())
            .field("ledger_subscribers", &self.ledger.receiver_count())
            .finish()
    }
}
