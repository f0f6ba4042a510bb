//! Typed subscribers.
//!
//! | Subscriber | Events | Buffer | Persisted |
//! |------------|--------|--------|-----------|
//! | `OrderSub` | order | append | on time update |
//! | `TradeSub` | trade | append | on time update |
//! | `PartySub` | party | append | on time update |
//! | `AccountSub` | account | keyed by account id | on time update |
//! | `MarketSub` | market created/updated | keyed by market id | on time update |
//! | `MarketDataSub` | market data | keyed by market id | on time update |
//! | `RiskFactorSub` | risk factor | keyed by market id | on time update |
//! | `TransferResponseSub` | transfer responses | entries append, balances keyed | on time update |
//! | `CandleSub` | trade | keyed by (market, interval, start) | on time update |
//! | `DelegationBalanceSub` | delegation balance | none | per event |
//! | `TransferSub` | transfer | none | per event |
//! | `EpochSub` | epoch update | none | per event |
//! | `CheckpointSub` | checkpoint | none | per event |
//! | `NodesSub` | validator update/score/ranking, key rotation | node view | per event |
//! | `GovernanceDataSub` | proposal, vote | per proposal | queried |
//! | `MarketDepthBuilder` | order | price levels | queried, update listeners |
//! | `NetParamsSub` | network parameter | keyed by key | queried |
//! | `TimeSub` | time update | latest time | queried, watch channel |
//!
//! Buffering subscribers skip empty flushes and ignore event types they do
//! not handle. Per-event subscribers panic on any event type they do not
//! handle: that only happens when broker routing is broken.

mod accounts;
mod candles;
mod checkpoints;
mod delegations;
mod epochs;
mod governance;
mod market_data;
mod market_depth;
mod markets;
mod net_params;
mod nodes;
mod orders;
mod parties;
mod risk_factors;
mod time;
mod trades;
mod transfer_responses;
mod transfers;

pub use accounts::AccountSub;
pub use candles::{CandleSub, DEFAULT_CANDLE_INTERVALS};
pub use checkpoints::CheckpointSub;
pub use delegations::DelegationBalanceSub;
pub use epochs::EpochSub;
pub use governance::{
    proposals_by_party, proposals_in_state, GovernanceData, GovernanceDataSub, ProposalFilter,
};
pub use market_data::MarketDataSub;
pub use market_depth::{MarketDepth, MarketDepthBuilder, MarketDepthUpdate, PriceLevel};
pub use markets::MarketSub;
pub use net_params::NetParamsSub;
pub use nodes::NodesSub;
pub use orders::OrderSub;
pub use parties::PartySub;
pub use risk_factors::RiskFactorSub;
pub use time::TimeSub;
pub use trades::TradeSub;
pub use transfer_responses::TransferResponseSub;
pub use transfers::TransferSub;

use dn_telemetry::{STORE_ERRORS, SUBSCRIBER_FLUSHES};
use shared_bus::Event;
use shared_types::errors::StoreResult;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{debug, error};

/// Persist a drained buffer. Empty batches are skipped; failures are logged
/// and dropped.
pub(crate) fn persist<T>(
    subscriber: &'static str,
    batch: Vec<T>,
    save: impl FnOnce(Vec<T>) -> StoreResult<()>,
) {
    persist_with(subscriber, batch.len(), || save(batch));
}

/// Like [`persist`] for stores that take more than one collection per flush.
pub(crate) fn persist_with(
    subscriber: &'static str,
    records: usize,
    save: impl FnOnce() -> StoreResult<()>,
) {
    if records == 0 {
        return;
    }
    SUBSCRIBER_FLUSHES.with_label_values(&[subscriber]).inc();
    match save() {
        Ok(()) => debug!(subscriber, records, "Flushed buffer"),
        Err(e) => {
            STORE_ERRORS.with_label_values(&[subscriber]).inc();
            error!(subscriber, records, error = %e, "Failed to persist batch");
        }
    }
}

/// Log a per-event store failure.
pub(crate) fn log_store_error(subscriber: &'static str, event: &Event, result: StoreResult<()>) {
    if let Err(e) = result {
        STORE_ERRORS.with_label_values(&[subscriber]).inc();
        error!(
            subscriber,
            trace_id = event.trace_id(),
            error = %e,
            "Failed to persist event"
        );
    }
}

/// Broker routing delivered an event type this subscriber never declared.
#[allow(clippy::panic)]
pub(crate) fn misrouted(subscriber: &'static str, event: &Event) -> ! {
    error!(
        subscriber,
        event_type = %event.event_type(),
        trace_id = event.trace_id(),
        "Received unexpected event type"
    );
    panic!(
        "{subscriber} subscriber received unexpected event type {}",
        event.event_type()
    );
}

/// Swap out an append buffer, keeping its capacity for the next interval.
pub(crate) fn drain_vec<T>(buf: &mut Vec<T>) -> Vec<T> {
    let cap = buf.capacity();
    std::mem::replace(buf, Vec::with_capacity(cap))
}

/// Swap out a keyed buffer, keeping its capacity for the next interval.
pub(crate) fn drain_map<K: Eq + Hash, V>(buf: &mut HashMap<K, V>) -> Vec<V> {
    let cap = buf.capacity();
    std::mem::replace(buf, HashMap::with_capacity(cap))
        .into_values()
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use shared_bus::{Event, EventPayload};

    pub fn ev(payload: EventPayload) -> Event {
        Event::new("trace", payload)
    }

    pub fn tick(t: i64) -> Event {
        Event::time_update("trace", t)
    }
}
