//! Orders subscriber: buffers order updates and saves them on each time
//! update, in arrival order.

use super::{drain_vec, persist};
use crate::config::SubscriberConfig;
use crate::ports::outbound::OrderStore;
use parking_lot::Mutex;
use shared_bus::{spawn_loop, Base, EventBatch, EventPayload, EventType, Subscriber};
use shared_types::entities::Order;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct OrderSub<S: OrderStore> {
    base: Base,
    store: Arc<S>,
    buf: Mutex<Vec<Order>>,
}

impl<S: OrderStore + 'static> OrderSub<S> {
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

impl<S: OrderStore + 'static> Subscriber for OrderSub<S> {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        vec![EventType::OrderEvent, EventType::TimeUpdate]
    }

    fn push(&self, events: EventBatch) {
        for event in events {
            match event.into_payload() {
                EventPayload::Order(order) => self.buf.lock().push(order),
                EventPayload::TimeUpdate(_) => self.flush(),
                _ => {}
            }
        }
    }

    fn name(&self) -> &'static str {
        "orders"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::RecordingStore;
    use crate::subscribers::test_support::{ev, tick};

    fn order(id: &str) -> Order {
        Order {
            id: id.into(),
            ..Order::default()
        }
    }

    #[test]
    fn test_flush_on_time_update() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Order>::new());
        let sub = OrderSub::new(&ctx, store.clone(), SubscriberConfig::ack());

        sub.push(vec![
            ev(EventPayload::Order(order("o1"))),
            ev(EventPayload::Order(order("o2"))),
        ]);
        assert_eq!(store.batch_count(), 0);

        sub.push(vec![tick(1)]);
        assert_eq!(store.batch_count(), 1);
        let ids: Vec<_> = store.records().into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["o1", "o2"]);
    }

    #[test]
    fn test_empty_flush_skipped() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Order>::new());
        let sub = OrderSub::new(&ctx, store.clone(), SubscriberConfig::ack());

        sub.push(vec![ev(EventPayload::Order(order("o1"))), tick(1)]);
        sub.push(vec![tick(2)]);
        assert_eq!(store.batch_count(), 1);
    }

    #[test]
    fn test_store_failure_drops_batch() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Order>::new());
        let sub = OrderSub::new(&ctx, store.clone(), SubscriberConfig::ack());

        store.set_failing(true);
        sub.push(vec![ev(EventPayload::Order(order("o1"))), tick(1)]);
        store.set_failing(false);
        sub.push(vec![tick(2)]);

        // Not retried on the next flush.
        assert_eq!(store.batch_count(), 0);
    }
}
