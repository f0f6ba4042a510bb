//! Delegation balance subscriber: persists every delegation balance change as
//! it arrives.

use super::{log_store_error, misrouted};
use crate::config::SubscriberConfig;
use crate::ports::outbound::DelegationStore;
use shared_bus::{spawn_loop, Base, EventBatch, EventPayload, EventType, Subscriber};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct DelegationBalanceSub<S: DelegationStore> {
    base: Base,
    store: Arc<S>,
}

impl<S: DelegationStore + 'static> DelegationBalanceSub<S> {
    pub fn new(ctx: &CancellationToken, store: Arc<S>, config: SubscriberConfig) -> Arc<Self> {
        let sub = Arc::new(Self {
            base: Base::new(ctx, config.buffer_size, config.ack),
            store,
        });
        spawn_loop(&sub);
        sub
    }
}

impl<S: DelegationStore + 'static> Subscriber for DelegationBalanceSub<S> {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        vec![EventType::DelegationBalanceEvent]
    }

    fn push(&self, events: EventBatch) {
        for event in events {
            match event.payload() {
                EventPayload::DelegationBalance(delegation) => {
                    let result = self.store.add_delegation(delegation.clone());
                    log_store_error(self.name(), &event, result);
                }
                _ => misrouted(self.name(), &event),
            }
        }
    }

    fn name(&self) -> &'static str {
        "delegations"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::RecordingStore;
    use crate::subscribers::test_support::{ev, tick};
    use shared_types::entities::{Delegation, U256};

    #[test]
    fn test_each_event_persisted_immediately() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Delegation>::new());
        let sub = DelegationBalanceSub::new(&ctx, store.clone(), SubscriberConfig::ack());

        for epoch in 1..=3 {
            sub.push(vec![ev(EventPayload::DelegationBalance(Delegation {
                party_id: "alice".into(),
                node_id: "n1".into(),
                epoch_seq: epoch,
                amount: U256::from(100),
            }))]);
        }

        assert_eq!(store.batch_count(), 3);
        assert_eq!(store.records()[2].epoch_seq, 3);
    }

    #[test]
    fn test_store_failure_is_not_fatal() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Delegation>::new());
        store.set_failing(true);
        let sub = DelegationBalanceSub::new(&ctx, store.clone(), SubscriberConfig::ack());

        sub.push(vec![ev(EventPayload::DelegationBalance(Delegation::default()))]);
        assert_eq!(store.batch_count(), 0);
    }

    #[test]
    #[should_panic(expected = "unexpected event type")]
    fn test_misrouted_event_panics() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Delegation>::new());
        let sub = DelegationBalanceSub::new(&ctx, store, SubscriberConfig::ack());

        sub.push(vec![tick(1)]);
    }
}
