//! Risk factor subscriber: latest factors per market, saved on each time
//! update.

use super::{drain_map, persist};
use crate::config::SubscriberConfig;
use crate::ports::outbound::RiskFactorStore;
use parking_lot::Mutex;
use shared_bus::{spawn_loop, Base, EventBatch, EventPayload, EventType, Subscriber};
use shared_types::entities::RiskFactor;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct RiskFactorSub<S: RiskFactorStore> {
    base: Base,
    store: Arc<S>,
    buf: Mutex<HashMap<String, RiskFactor>>,
}

impl<S: RiskFactorStore + 'static> RiskFactorSub<S> {
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

impl<S: RiskFactorStore + 'static> Subscriber for RiskFactorSub<S> {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        vec![EventType::RiskFactorEvent, EventType::TimeUpdate]
    }

    fn push(&self, events: EventBatch) {
        for event in events {
            match event.into_payload() {
                EventPayload::RiskFactor(rf) => {
                    self.buf.lock().insert(rf.market_id.clone(), rf);
                }
                EventPayload::TimeUpdate(_) => self.flush(),
                _ => {}
            }
        }
    }

    fn name(&self) -> &'static str {
        "risk_factors"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::RecordingStore;
    use crate::subscribers::test_support::{ev, tick};

    fn rf(market: &str, short: f64) -> RiskFactor {
        RiskFactor {
            market_id: market.into(),
            short,
            long: 0.5,
        }
    }

    #[test]
    fn test_keyed_by_market() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<RiskFactor>::new());
        let sub = RiskFactorSub::new(&ctx, store.clone(), SubscriberConfig::ack());

        sub.push(vec![
            ev(EventPayload::RiskFactor(rf("m1", 0.1))),
            ev(EventPayload::RiskFactor(rf("m2", 0.2))),
            ev(EventPayload::RiskFactor(rf("m1", 0.3))),
            tick(1),
        ]);

        let mut rows = store.records();
        rows.sort_by(|a, b| a.market_id.cmp(&b.market_id));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].short, 0.3);
        assert_eq!(rows[1].short, 0.2);
    }
}
