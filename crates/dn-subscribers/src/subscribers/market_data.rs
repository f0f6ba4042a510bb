//! Market data subscriber: latest snapshot per market, saved on each time
//! update.

use super::{drain_map, persist};
use crate::config::SubscriberConfig;
use crate::ports::outbound::MarketDataStore;
use parking_lot::Mutex;
use shared_bus::{spawn_loop, Base, EventBatch, EventPayload, EventType, Subscriber};
use shared_types::entities::MarketData;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct MarketDataSub<S: MarketDataStore> {
    base: Base,
    store: Arc<S>,
    buf: Mutex<HashMap<String, MarketData>>,
}

impl<S: MarketDataStore + 'static> MarketDataSub<S> {
    pub fn new(ctx: &CancellationToken, store: Arc<S>, config: SubscriberConfig) -> Arc<Self> {
        let sub = Arc::new(Self {
            base: Base::new(ctx, config.buffer_size, config.ack),
            store,
            buf: Mutex::new(HashMap::new()),
        });
        spawn_loop(&sub);
        sub
    }

    fn flush(&self) {
        let batch = drain_map(&mut self.buf.lock());
        persist(self.name(), batch, |b| self.store.save_batch(b));
    }
}

impl<S: MarketDataStore + 'static> Subscriber for MarketDataSub<S> {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        vec![EventType::MarketDataEvent, EventType::TimeUpdate]
    }

    fn push(&self, events: EventBatch) {
        for event in events {
            match event.into_payload() {
                EventPayload::MarketData(data) => {
                    self.buf.lock().insert(data.market_id.clone(), data);
                }
                EventPayload::TimeUpdate(_) => self.flush(),
                _ => {}
            }
        }
    }

    fn name(&self) -> &'static str {
        "market_data"
    }
}
