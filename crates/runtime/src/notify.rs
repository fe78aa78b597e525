//! Notice delivery through the event bus.

use tracing::info;

use arbiter_core::{Notice, Notifier};

use crate::events::{Event, EventBus};

/// Publishes every notice on [`Topic::Notice`](crate::events::Topic::Notice).
#[derive(Clone, Debug)]
pub struct BusNotifier {
    bus: EventBus,
}

impl BusNotifier {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

impl Notifier for BusNotifier {
    fn notify(&self, notice: Notice) {
        info!(actor = %notice.actor, kind = %notice.kind, "{}", notice.message);
        self.bus.publish(Event::Notice(notice));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Topic;
    use arbiter_core::{ActorId, DenyReason, NoticeKind};

    #[tokio::test]
    async fn notices_are_published() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(Topic::Notice);
        let notifier = BusNotifier::new(bus);

        notifier.notify(Notice::denied(
            ActorId(4),
            DenyReason::InsufficientResource {
                needed: 20.0,
                available: 15.0,
            },
        ));

        let Event::Notice(notice) = rx.recv().await.unwrap() else {
            panic!("expected a notice");
        };
        assert_eq!(notice.kind, NoticeKind::Denied);
        assert_eq!(notice.message, "Not enough power: need 20, have 15");
    }
}
