//! Integration flows across the bus, subscribers and parameters store.

pub mod flows;
pub mod netparams;
pub mod observe;

use shared_bus::{Event, EventPayload};
use shared_types::entities::{Order, OrderStatus, Side, Timestamp};
use std::time::Duration;

/// Upper bound for any waiting assertion.
pub const WAIT: Duration = Duration::from_secs(2);

pub fn event(payload: EventPayload) -> Event {
    Event::new("integration", payload)
}

pub fn tick(time: Timestamp) -> Event {
    Event::time_update("integration", time)
}

pub fn active_order(id: &str, market: &str, side: Side, price: u64, size: u64) -> Order {
    Order {
        id: id.into(),
        market_id: market.into(),
        party_id: format!("party-{id}"),
        side,
        price,
        size,
        remaining: size,
        status: OrderStatus::Active,
        ..Order::default()
    }
}

/// Poll `cond` until it holds or [`WAIT`] elapses.
pub async fn wait_for(cond: impl Fn() -> bool) -> bool {
    tokio::time::timeout(WAIT, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .is_ok()
}
