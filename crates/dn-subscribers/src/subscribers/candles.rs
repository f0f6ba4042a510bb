//! Candles subscriber: folds trades into OHLCV candles for every configured
//! interval. Candles touched since the last time update are saved on the
//! next one; candles whose bucket has closed are then dropped from memory.

use super::persist;
use crate::config::SubscriberConfig;
use crate::ports::outbound::CandleStore;
use parking_lot::Mutex;
use shared_bus::{spawn_loop, Base, EventBatch, EventPayload, EventType, Subscriber};
use shared_types::entities::{Candle, MarketId, Timestamp, Trade};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const MINUTE: i64 = 60 * 1_000_000_000;

/// 1m, 5m, 15m, 1h, 6h and 1d, in nanoseconds.
pub const DEFAULT_CANDLE_INTERVALS: [i64; 6] = [
    MINUTE,
    5 * MINUTE,
    15 * MINUTE,
    60 * MINUTE,
    6 * 60 * MINUTE,
    24 * 60 * MINUTE,
];

type CandleKey = (MarketId, i64, Timestamp);

#[derive(Default)]
struct CandleBook {
    open: HashMap<CandleKey, Candle>,
    dirty: BTreeSet<CandleKey>,
}

impl CandleBook {
    fn add_trade(&mut self, trade: &Trade, intervals: &[i64]) {
        for &interval in intervals {
            let start = trade.timestamp.saturating_sub(trade.timestamp.rem_euclid(interval));
            let key = (trade.market_id.clone(), interval, start);
            let candle = self.open.entry(key.clone()).or_insert_with(|| Candle {
                market_id: trade.market_id.clone(),
                interval,
                start,
                open: trade.price,
                high: trade.price,
                low: trade.price,
                close: trade.price,
                volume: 0,
                last_update: trade.timestamp,
            });
            candle.high = candle.high.max(trade.price);
            candle.low = candle.low.min(trade.price);
            candle.close = trade.price;
            candle.volume = candle.volume.saturating_add(trade.size);
            candle.last_update = trade.timestamp;
            self.dirty.insert(key);
        }
    }

    /// Touched candles in key order, then forget buckets closed by `now`.
    fn take_dirty(&mut self, now: Timestamp) -> Vec<Candle> {
        let dirty = std::mem::take(&mut self.dirty);
        let batch = dirty
            .iter()
            .filter_map(|key| self.open.get(key).cloned())
            .collect();
        self.open
            .retain(|(_, interval, start), _| start.saturating_add(*interval) > now);
        batch
    }
}

pub struct CandleSub<S: CandleStore> {
    base: Base,
    store: Arc<S>,
    intervals: Vec<i64>,
    book: Mutex<CandleBook>,
}

impl<S: CandleStore + 'static> CandleSub<S> {
    pub fn new(ctx: &CancellationToken, store: Arc<S>, config: SubscriberConfig) -> Arc<Self> {
        Self::with_intervals(ctx, store, DEFAULT_CANDLE_INTERVALS.to_vec(), config)
    }

    /// Candles for the given intervals only. Non-positive intervals are
    /// ignored.
    pub fn with_intervals(
        ctx: &CancellationToken,
        store: Arc<S>,
        mut intervals: Vec<i64>,
        config: SubscriberConfig,
    ) -> Arc<Self> {
        intervals.retain(|i| *i > 0);
        intervals.sort_unstable();
        intervals.dedup();

        let sub = Arc::new(Self {
            base: Base::new(ctx, config.buffer_size, config.ack),
            store,
            intervals,
            book: Mutex::new(CandleBook::default()),
        });
        spawn_loop(&sub);
        sub
    }

    fn flush(&self, now: Timestamp) {
        let batch = self.book.lock().take_dirty(now);
        persist(self.name(), batch, |b| self.store.save_batch(b));
    }

    /// Candles still accumulating.
    #[must_use]
    pub fn open_candles(&self) -> usize {
        self.book.lock().open.len()
    }
}

impl<S: CandleStore + 'static> Subscriber for CandleSub<S> {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        vec![EventType::TradeEvent, EventType::TimeUpdate]
    }

    fn push(&self, events: EventBatch) {
        for event in events {
            match event.payload() {
                EventPayload::Trade(trade) => self.book.lock().add_trade(trade, &self.intervals),
                EventPayload::TimeUpdate(now) => self.flush(*now),
                _ => {}
            }
        }
    }

    fn name(&self) -> &'static str {
        "candles"
    }
}
