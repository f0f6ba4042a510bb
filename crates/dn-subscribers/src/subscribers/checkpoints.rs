//! Checkpoint subscriber: persists every core state checkpoint as it arrives.

use super::{log_store_error, misrouted};
use crate::config::SubscriberConfig;
use crate::ports::outbound::CheckpointStore;
use shared_bus::{spawn_loop, Base, EventBatch, EventPayload, EventType, Subscriber};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct CheckpointSub<S: CheckpointStore> {
    base: Base,
    store: Arc<S>,
}

impl<S: CheckpointStore + 'static> CheckpointSub<S> {
    pub fn new(ctx: &CancellationToken, store: Arc<S>, config: SubscriberConfig) -> Arc<Self> {
        let sub = Arc::new(Self {
            base: Base::new(ctx, config.buffer_size, config.ack),
            store,
        });
        spawn_loop(&sub);
        sub
    }
}

impl<S: CheckpointStore + 'static> Subscriber for CheckpointSub<S> {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        vec![EventType::CheckpointEvent]
    }

    fn push(&self, events: EventBatch) {
        for event in events {
            match event.payload() {
                EventPayload::Checkpoint(checkpoint) => {
                    let result = self.store.save(checkpoint.clone());
                    log_store_error(self.name(), &event, result);
                }
                _ => misrouted(self.name(), &event),
            }
        }
    }

    fn name(&self) -> &'static str {
        "checkpoints"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::RecordingStore;
    use crate::subscribers::test_support::{ev, tick};
    use shared_types::entities::Checkpoint;

    #[test]
    fn test_checkpoint_saved() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Checkpoint>::new());
        let sub = CheckpointSub::new(&ctx, store.clone(), SubscriberConfig::ack());

        sub.push(vec![ev(EventPayload::Checkpoint(Checkpoint {
            hash: "abc".into(),
            block_hash: "def".into(),
            block_height: 100,
        }))]);

        assert_eq!(store.records()[0].block_height, 100);
    }

    #[test]
    #[should_panic(expected = "unexpected event type")]
    fn test_misrouted_event_panics() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Checkpoint>::new());
        let sub = CheckpointSub::new(&ctx, store, SubscriberConfig::ack());

        sub.push(vec![tick(1)]);
    }
}
