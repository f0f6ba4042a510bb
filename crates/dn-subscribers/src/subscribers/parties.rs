//! Parties subscriber: buffers newly seen parties and saves them on each
//! time update.

use super::{drain_vec, persist};
use crate::config::SubscriberConfig;
use crate::ports::outbound::PartyStore;
use parking_lot::Mutex;
use shared_bus::{spawn_loop, Base, EventBatch, EventPayload, EventType, Subscriber};
use shared_types::entities::Party;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct PartySub<S: PartyStore> {
    base: Base,
    store: Arc<S>,
    buf: Mutex<Vec<Party>>,
}

impl<S: PartyStore + 'static> PartySub<S> {
    pub fn new(ctx: &CancellationToken, store: Arc<S>, config: SubscriberConfig) -> Arc<Self> {
        let sub = Arc::new(Self {
            base: Base::new(ctx, config.buffer_size, config.ack),
            store,
            buf: Mutex::new(Vec::new()),
        });
        spawn_loop(&sub);
        sub
    }

    fn flush(&self) {
        let batch = drain_vec(&mut self.buf.lock());
        persist(self.name(), batch, |b| self.store.save_batch(b));
    }
}

impl<S: PartyStore + 'static> Subscriber for PartySub<S> {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        vec![EventType::PartyEvent, EventType::TimeUpdate]
    }

    fn push(&self, events: EventBatch) {
        for event in events {
            match event.into_payload() {
                EventPayload::Party(party) => self.buf.lock().push(party),
                EventPayload::TimeUpdate(_) => self.flush(),
                _ => {}
            }
        }
    }

    fn name(&self) -> &'static str {
        "parties"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::RecordingStore;
    use crate::subscribers::test_support::{ev, tick};

    #[test]
    fn test_append_only_no_dedup() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Party>::new());
        let sub = PartySub::new(&ctx, store.clone(), SubscriberConfig::ack());

        let alice = Party { id: "alice".into() };
        sub.push(vec![
            ev(EventPayload::Party(alice.clone())),
            ev(EventPayload::Party(alice)),
            tick(1),
        ]);

        assert_eq!(store.records().len(), 2);
    }
}
