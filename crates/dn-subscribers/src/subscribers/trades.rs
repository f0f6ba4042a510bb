//! Trades subscriber: buffers executed trades and saves them on each time
//! update, in execution order.

use super::{drain_vec, persist};
use crate::config::SubscriberConfig;
use crate::ports::outbound::TradeStore;
use parking_lot::Mutex;
use shared_bus::{spawn_loop, Base, EventBatch, EventPayload, EventType, Subscriber};
use shared_types::entities::Trade;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct TradeSub<S: TradeStore> {
    base: Base,
    store: Arc<S>,
    buf: Mutex<Vec<Trade>>,
}

impl<S: TradeStore + 'static> TradeSub<S> {
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

impl<S: TradeStore + 'static> Subscriber for TradeSub<S> {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        vec![EventType::TradeEvent, EventType::TimeUpdate]
    }

    fn push(&self, events: EventBatch) {
        for event in events {
            match event.into_payload() {
                EventPayload::Trade(trade) => self.buf.lock().push(trade),
                EventPayload::TimeUpdate(_) => self.flush(),
                _ => {}
            }
        }
    }

    fn name(&self) -> &'static str {
        "trades"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::RecordingStore;
    use crate::subscribers::test_support::{ev, tick};
    use shared_types::entities::Vote;

    fn trade(id: &str) -> Trade {
        Trade {
            id: id.into(),
            ..Trade::default()
        }
    }

    #[test]
    fn test_batch_preserves_push_order() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Trade>::new());
        let sub = TradeSub::new(&ctx, store.clone(), SubscriberConfig::ack());

        sub.push(vec![ev(EventPayload::Trade(trade("t1")))]);
        sub.push(vec![
            ev(EventPayload::Trade(trade("t2"))),
            ev(EventPayload::Trade(trade("t3"))),
        ]);
        sub.push(vec![tick(1)]);

        let batches = store.batches();
        assert_eq!(batches.len(), 1);
        let ids: Vec<_> = batches[0].iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn test_unhandled_events_ignored() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Trade>::new());
        let sub = TradeSub::new(&ctx, store.clone(), SubscriberConfig::ack());

        sub.push(vec![ev(EventPayload::Vote(Vote::default())), tick(1)]);
        assert_eq!(store.batch_count(), 0);
    }

    #[tokio::test]
    async fn test_loop_mode_flushes() {
        use std::time::Duration;

        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Trade>::new());
        let sub = TradeSub::new(&ctx, store.clone(), SubscriberConfig::default());

        sub.base()
            .c()
            .send(vec![ev(EventPayload::Trade(trade("t1"))), tick(1)])
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(1), async {
            while store.batch_count() == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        ctx.cancel();
    }
}
