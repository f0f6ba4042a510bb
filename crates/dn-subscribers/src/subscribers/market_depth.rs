//! # Market Depth
//!
//! Builds the live order book depth of every market from order events and
//! pushes per-order level changes to registered listeners.
//!
//! ## Book Rules
//!
//! | Order | Effect |
//! |-------|--------|
//! | market, FOK or IOC | ignored, never rests on the book |
//! | status unspecified or rejected | ignored |
//! | new, active, remaining > 0 | added to its price level |
//! | known, cancelled/expired/stopped/filled/partially filled/parked | removed |
//! | known, same price | level volume adjusted, removed at zero remaining |
//! | known, new price | moved to the new level |
//!
//! Buy levels are kept in descending price order, sell levels ascending.
//! Every accepted order bumps the market's sequence number.

use crate::config::SubscriberConfig;
use crate::error::{SubscriberError, SubscriberResult};
use parking_lot::RwLock;
use serde::Serialize;
use shared_bus::{spawn_loop, Base, EventBatch, EventPayload, EventType, Subscriber};
use shared_types::entities::{Order, OrderStatus, Side};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Aggregated orders at one price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PriceLevel {
    pub price: u64,
    pub number_of_orders: u64,
    pub volume: u64,
}

/// Snapshot of a market's book.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MarketDepth {
    pub market_id: String,
    pub buy: Vec<PriceLevel>,
    pub sell: Vec<PriceLevel>,
    pub sequence_number: u64,
}

/// Levels touched by one order event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MarketDepthUpdate {
    pub market_id: String,
    pub buy: Vec<PriceLevel>,
    pub sell: Vec<PriceLevel>,
    pub sequence_number: u64,
}

#[derive(Default)]
struct Book {
    live_orders: HashMap<String, Order>,
    /// Descending by price.
    buy: Vec<PriceLevel>,
    /// Ascending by price.
    sell: Vec<PriceLevel>,
    sequence_number: u64,
    changes: Vec<(Side, PriceLevel)>,
}

impl Book {
    fn side(&self, side: Side) -> &Vec<PriceLevel> {
        if side == Side::Buy {
            &self.buy
        } else {
            &self.sell
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut Vec<PriceLevel> {
        if side == Side::Buy {
            &mut self.buy
        } else {
            &mut self.sell
        }
    }

    /// Insertion point for `price` and whether a level already sits there.
    fn search(&self, side: Side, price: u64) -> (usize, bool) {
        let levels = self.side(side);
        let idx = if side == Side::Buy {
            levels.partition_point(|l| l.price > price)
        } else {
            levels.partition_point(|l| l.price < price)
        };
        (idx, idx < levels.len() && levels[idx].price == price)
    }

    fn level(&self, side: Side, price: u64) -> Option<&PriceLevel> {
        match self.search(side, price) {
            (idx, true) => self.side(side).get(idx),
            _ => None,
        }
    }

    fn add_order(&mut self, order: &Order) {
        self.live_orders.insert(order.id.clone(), order.clone());

        let (idx, found) = self.search(order.side, order.price);
        let levels = self.side_mut(order.side);
        if found {
            levels[idx].number_of_orders += 1;
            levels[idx].volume += order.remaining;
        } else {
            levels.insert(
                idx,
                PriceLevel {
                    price: order.price,
                    number_of_orders: 1,
                    volume: order.remaining,
                },
            );
        }
        let level = levels[idx];
        self.changes.push((order.side, level));
    }

    fn remove_order(&mut self, order: &Order) {
        let (idx, found) = self.search(order.side, order.price);
        if !found {
            warn!(order_id = %order.id, price = order.price, "Unknown price level");
            return;
        }
        let levels = self.side_mut(order.side);
        let level = &mut levels[idx];
        level.number_of_orders = level.number_of_orders.saturating_sub(1);
        level.volume = level.volume.saturating_sub(order.remaining);
        let snapshot = *level;
        if snapshot.number_of_orders == 0 {
            levels.remove(idx);
        }
        self.changes.push((order.side, snapshot));
        self.live_orders.remove(&order.id);
    }

    fn update_order(&mut self, original: &Order, order: &Order) {
        if original.price != order.price {
            self.remove_order(original);
            if order.remaining > 0 {
                self.add_order(order);
            }
            return;
        }

        if order.remaining == 0 {
            self.remove_order(original);
            return;
        }

        let (idx, found) = self.search(original.side, original.price);
        if !found {
            warn!(order_id = %order.id, price = order.price, "Unknown price level");
            return;
        }
        let levels = self.side_mut(original.side);
        let level = &mut levels[idx];
        level.volume = (level.volume + order.remaining).saturating_sub(original.remaining);
        let snapshot = *level;
        self.changes.push((original.side, snapshot));

        if let Some(live) = self.live_orders.get_mut(&order.id) {
            live.remaining = order.remaining;
            live.size = order.size;
        }
    }

    fn apply(&mut self, order: &Order) {
        self.sequence_number += 1;
        self.changes.clear();

        match self.live_orders.get(&order.id).cloned() {
            Some(original) if order.status.leaves_book() => self.remove_order(&original),
            Some(original) => self.update_order(&original, order),
            None => {
                if order.remaining > 0 && order.status == OrderStatus::Active {
                    self.add_order(order);
                }
            }
        }
    }

    fn snapshot(&self, market_id: &str, limit: usize) -> MarketDepth {
        let take = |levels: &Vec<PriceLevel>| {
            let n = if limit > 0 { limit.min(levels.len()) } else { levels.len() };
            levels[..n].to_vec()
        };
        MarketDepth {
            market_id: market_id.to_string(),
            buy: take(&self.buy),
            sell: take(&self.sell),
            sequence_number: self.sequence_number,
        }
    }
}

#[derive(Default)]
struct DepthState {
    books: HashMap<String, Book>,
    listeners: BTreeMap<u64, mpsc::Sender<MarketDepthUpdate>>,
    next_listener: u64,
}

/// Order subscriber maintaining the market depth of every market.
pub struct MarketDepthBuilder {
    base: Base,
    state: RwLock<DepthState>,
}

impl MarketDepthBuilder {
    pub fn new(ctx: &CancellationToken, config: SubscriberConfig) -> Arc<Self> {
        let sub = Arc::new(Self {
            base: Base::new(ctx, config.buffer_size, config.ack),
            state: RwLock::new(DepthState::default()),
        });
        spawn_loop(&sub);
        sub
    }

    fn update_market_depth(&self, order: &Order) {
        if !order.is_persistent() {
            return;
        }
        if matches!(order.status, OrderStatus::Unspecified | OrderStatus::Rejected) {
            return;
        }

        let mut state = self.state.write();
        let book = state.books.entry(order.market_id.clone()).or_default();
        book.apply(order);

        let mut update = MarketDepthUpdate {
            market_id: order.market_id.clone(),
            sequence_number: book.sequence_number,
            ..MarketDepthUpdate::default()
        };
        for (side, level) in book.changes.drain(..) {
            if side == Side::Buy {
                update.buy.push(level);
            } else {
                update.sell.push(level);
            }
        }

        state.listeners.retain(|id, tx| match tx.try_send(update.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(listener = id, "Market depth listener lagging, update dropped");
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!(listener = id, "Market depth listener gone");
                false
            }
        });
    }

    /// Current depth of `market`, at most `limit` levels per side (0 means
    /// all). Unknown markets yield an empty book.
    #[must_use]
    pub fn get_market_depth(&self, market: &str, limit: usize) -> MarketDepth {
        let state = self.state.read();
        match state.books.get(market) {
            Some(book) => book.snapshot(market, limit),
            None => MarketDepth {
                market_id: market.to_string(),
                ..MarketDepth::default()
            },
        }
    }

    /// Register for per-order depth updates.
    pub fn subscribe(&self, updates: mpsc::Sender<MarketDepthUpdate>) -> u64 {
        let mut state = self.state.write();
        state.next_listener += 1;
        let id = state.next_listener;
        state.listeners.insert(id, updates);
        id
    }

    pub fn unsubscribe(&self, id: u64) -> SubscriberResult<()> {
        let mut state = self.state.write();
        if state.listeners.is_empty() {
            return Ok(());
        }
        state
            .listeners
            .remove(&id)
            .map(|_| ())
            .ok_or(SubscriberError::UnknownDepthListener(id))
    }

    /// Live orders in `market`, or -1 if the levels disagree with them.
    #[must_use]
    pub fn order_count(&self, market: &str) -> i64 {
        let state = self.state.read();
        let Some(book) = state.books.get(market) else {
            return 0;
        };
        let on_levels: u64 = book
            .buy
            .iter()
            .chain(book.sell.iter())
            .map(|l| l.number_of_orders)
            .sum();
        let live = book.live_orders.len() as u64;
        if live == on_levels {
            live as i64
        } else {
            -1
        }
    }

    #[must_use]
    pub fn volume_at_price(&self, market: &str, side: Side, price: u64) -> u64 {
        let state = self.state.read();
        state
            .books
            .get(market)
            .and_then(|b| b.level(side, price))
            .map_or(0, |l| l.volume)
    }

    #[must_use]
    pub fn order_count_at_price(&self, market: &str, side: Side, price: u64) -> u64 {
        let state = self.state.read();
        state
            .books
            .get(market)
            .and_then(|b| b.level(side, price))
            .map_or(0, |l| l.number_of_orders)
    }

    #[must_use]
    pub fn total_volume(&self, market: &str) -> u64 {
        let state = self.state.read();
        state.books.get(market).map_or(0, |b| {
            b.buy.iter().chain(b.sell.iter()).map(|l| l.volume).sum()
        })
    }

    #[must_use]
    pub fn best_bid_price(&self, market: &str) -> u64 {
        let state = self.state.read();
        state
            .books
            .get(market)
            .and_then(|b| b.buy.first())
            .map_or(0, |l| l.price)
    }

    #[must_use]
    pub fn best_ask_price(&self, market: &str) -> u64 {
        let state = self.state.read();
        state
            .books
            .get(market)
            .and_then(|b| b.sell.first())
            .map_or(0, |l| l.price)
    }

    #[must_use]
    pub fn buy_price_levels(&self, market: &str) -> usize {
        self.state.read().books.get(market).map_or(0, |b| b.buy.len())
    }

    #[must_use]
    pub fn sell_price_levels(&self, market: &str) -> usize {
        self.state.read().books.get(market).map_or(0, |b| b.sell.len())
    }

    #[must_use]
    pub fn price_levels(&self, market: &str) -> usize {
        self.buy_price_levels(market) + self.sell_price_levels(market)
    }
}

impl Subscriber for MarketDepthBuilder {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        vec![EventType::OrderEvent]
    }

    fn push(&self, events: EventBatch) {
        for event in &events {
            if let EventPayload::Order(order) = event.payload() {
                self.update_market_depth(order);
            }
        }
    }

    fn name(&self) -> &'static str {
        "market_depth"
    }
}
