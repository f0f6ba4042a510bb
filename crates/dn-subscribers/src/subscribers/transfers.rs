//! Transfers subscriber: persists every transfer update as it arrives.

use super::{log_store_error, misrouted};
use crate::config::SubscriberConfig;
use crate::ports::outbound::TransferStore;
use shared_bus::{spawn_loop, Base, EventBatch, EventPayload, EventType, Subscriber};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct TransferSub<S: TransferStore> {
    base: Base,
    store: Arc<S>,
}

impl<S: TransferStore + 'static> TransferSub<S> {
    pub fn new(ctx: &CancellationToken, store: Arc<S>, config: SubscriberConfig) -> Arc<Self> {
        let sub = Arc::new(Self {
            base: Base::new(ctx, config.buffer_size, config.ack),
            store,
        });
        spawn_loop(&sub);
        sub
    }
}

impl<S: TransferStore + 'static> Subscriber for TransferSub<S> {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        vec![EventType::TransferEvent]
    }

    fn push(&self, events: EventBatch) {
        for event in events {
            match event.payload() {
                EventPayload::Transfer(transfer) => {
                    let result = self.store.add_transfer(transfer.clone());
                    log_store_error(self.name(), &event, result);
                }
                _ => misrouted(self.name(), &event),
            }
        }
    }

    fn name(&self) -> &'static str {
        "transfers"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::RecordingStore;
    use crate::subscribers::test_support::{ev, tick};
    use shared_types::entities::{Transfer, TransferStatus};

    #[test]
    fn test_status_updates_persisted_in_order() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Transfer>::new());
        let sub = TransferSub::new(&ctx, store.clone(), SubscriberConfig::ack());

        let pending = Transfer {
            id: "tr-1".into(),
            ..Transfer::default()
        };
        let done = Transfer {
            status: TransferStatus::Done,
            ..pending.clone()
        };
        sub.push(vec![
            ev(EventPayload::Transfer(pending)),
            ev(EventPayload::Transfer(done)),
        ]);

        let statuses: Vec<_> = store.records().into_iter().map(|t| t.status).collect();
        assert_eq!(statuses, vec![TransferStatus::Pending, TransferStatus::Done]);
    }

    #[test]
    #[should_panic(expected = "unexpected event type")]
    fn test_misrouted_event_panics() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Transfer>::new());
        let sub = TransferSub::new(&ctx, store, SubscriberConfig::ack());

        sub.push(vec![tick(1)]);
    }
}
