//! Epoch subscriber: persists every epoch start and end as it arrives.

use super::{log_store_error, misrouted};
use crate::config::SubscriberConfig;
use crate::ports::outbound::EpochStore;
use shared_bus::{spawn_loop, Base, EventBatch, EventPayload, EventType, Subscriber};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct EpochSub<S: EpochStore> {
    base: Base,
    store: Arc<S>,
}

impl<S: EpochStore + 'static> EpochSub<S> {
    pub fn new(ctx: &CancellationToken, store: Arc<S>, config: SubscriberConfig) -> Arc<Self> {
        let sub = Arc::new(Self {
            base: Base::new(ctx, config.buffer_size, config.ack),
            store,
        });
        spawn_loop(&sub);
        sub
    }
}

impl<S: EpochStore + 'static> Subscriber for EpochSub<S> {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        vec![EventType::EpochUpdate]
    }

    fn push(&self, events: EventBatch) {
        for event in events {
            match event.payload() {
                EventPayload::EpochUpdate(epoch) => {
                    let result = self.store.add_epoch(epoch.clone());
                    log_store_error(self.name(), &event, result);
                }
                _ => misrouted(self.name(), &event),
            }
        }
    }

    fn name(&self) -> &'static str {
        "epochs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::RecordingStore;
    use crate::subscribers::test_support::ev;
    use shared_types::entities::{Epoch, EpochAction, Order};

    #[test]
    fn test_start_and_end_persisted() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Epoch>::new());
        let sub = EpochSub::new(&ctx, store.clone(), SubscriberConfig::ack());

        let start = Epoch {
            seq: 7,
            action: EpochAction::Start,
            ..Epoch::default()
        };
        let end = Epoch {
            action: EpochAction::End,
            ..start.clone()
        };
        sub.push(vec![ev(EventPayload::EpochUpdate(start)), ev(EventPayload::EpochUpdate(end))]);

        assert_eq!(store.batch_count(), 2);
    }

    #[test]
    #[should_panic(expected = "epochs subscriber received unexpected event type order")]
    fn test_misrouted_event_panics() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Epoch>::new());
        let sub = EpochSub::new(&ctx, store, SubscriberConfig::ack());

        sub.push(vec![ev(EventPayload::Order(Order::default()))]);
    }
}
