//! # Bus Events
//!
//! Defines every event that flows from the core node through the broker to
//! the subscribers.
//!
//! An [`Event`] is an immutable domain fact: one [`EventPayload`] variant plus
//! the trace id of the transaction that produced it. Routing uses the
//! [`EventType`] tag derived from the payload, so a subscriber declares the
//! tags it wants and matches on the payload it receives.

use serde::{Deserialize, Serialize};
use shared_types::entities::{
    Account, Checkpoint, Delegation, Epoch, KeyRotation, Market, MarketData, NetworkParameter,
    Order, Party, Proposal, RiskFactor, Timestamp, Trade, Transfer, TransferResponse,
    ValidatorRanking, ValidatorScore, ValidatorUpdate, Vote,
};
use std::fmt;

/// Event type tags used by the broker for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventType {
    /// Wildcard: a subscriber declaring `All` receives every event.
    All,
    TimeUpdate,
    OrderEvent,
    TradeEvent,
    AccountEvent,
    PartyEvent,
    MarketCreatedEvent,
    MarketUpdatedEvent,
    MarketDataEvent,
    RiskFactorEvent,
    ProposalEvent,
    VoteEvent,
    DelegationBalanceEvent,
    EpochUpdate,
    ValidatorUpdateEvent,
    ValidatorScoreEvent,
    ValidatorRankingEvent,
    KeyRotationEvent,
    CheckpointEvent,
    TransferEvent,
    TransferResponses,
    NetworkParameterEvent,
}

impl EventType {
    /// Stable snake_case name, used as a metric label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::TimeUpdate => "time_update",
            Self::OrderEvent => "order",
            Self::TradeEvent => "trade",
            Self::AccountEvent => "account",
            Self::PartyEvent => "party",
            Self::MarketCreatedEvent => "market_created",
            Self::MarketUpdatedEvent => "market_updated",
            Self::MarketDataEvent => "market_data",
            Self::RiskFactorEvent => "risk_factor",
            Self::ProposalEvent => "proposal",
            Self::VoteEvent => "vote",
            Self::DelegationBalanceEvent => "delegation_balance",
            Self::EpochUpdate => "epoch_update",
            Self::ValidatorUpdateEvent => "validator_update",
            Self::ValidatorScoreEvent => "validator_score",
            Self::ValidatorRankingEvent => "validator_ranking",
            Self::KeyRotationEvent => "key_rotation",
            Self::CheckpointEvent => "checkpoint",
            Self::TransferEvent => "transfer",
            Self::TransferResponses => "transfer_responses",
            Self::NetworkParameterEvent => "network_parameter",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The payload carried by an event. Exactly one per event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    // =========================================================================
    // CHAIN
    // =========================================================================
    /// Block time advanced. Flush trigger for most buffering subscribers.
    TimeUpdate(Timestamp),
    /// State checkpoint taken by the core.
    Checkpoint(Checkpoint),

    // =========================================================================
    // TRADING
    // =========================================================================
    Order(Order),
    Trade(Trade),
    MarketCreated(Market),
    MarketUpdated(Market),
    MarketData(MarketData),
    RiskFactor(RiskFactor),

    // =========================================================================
    // COLLATERAL
    // =========================================================================
    Account(Account),
    Party(Party),
    Transfer(Transfer),
    TransferResponses(Vec<TransferResponse>),

    // =========================================================================
    // GOVERNANCE
    // =========================================================================
    Proposal(Proposal),
    Vote(Vote),
    NetworkParameter(NetworkParameter),

    // =========================================================================
    // STAKING & VALIDATORS
    // =========================================================================
    DelegationBalance(Delegation),
    EpochUpdate(Epoch),
    ValidatorUpdate(ValidatorUpdate),
    ValidatorScore(ValidatorScore),
    ValidatorRanking(ValidatorRanking),
    KeyRotation(KeyRotation),
}

impl EventPayload {
    /// The routing tag for this payload.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Self::TimeUpdate(_) => EventType::TimeUpdate,
            Self::Checkpoint(_) => EventType::CheckpointEvent,
            Self::Order(_) => EventType::OrderEvent,
            Self::Trade(_) => EventType::TradeEvent,
            Self::MarketCreated(_) => EventType::MarketCreatedEvent,
            Self::MarketUpdated(_) => EventType::MarketUpdatedEvent,
            Self::MarketData(_) => EventType::MarketDataEvent,
            Self::RiskFactor(_) => EventType::RiskFactorEvent,
            Self::Account(_) => EventType::AccountEvent,
            Self::Party(_) => EventType::PartyEvent,
            Self::Transfer(_) => EventType::TransferEvent,
            Self::TransferResponses(_) => EventType::TransferResponses,
            Self::Proposal(_) => EventType::ProposalEvent,
            Self::Vote(_) => EventType::VoteEvent,
            Self::NetworkParameter(_) => EventType::NetworkParameterEvent,
            Self::DelegationBalance(_) => EventType::DelegationBalanceEvent,
            Self::EpochUpdate(_) => EventType::EpochUpdate,
            Self::ValidatorUpdate(_) => EventType::ValidatorUpdateEvent,
            Self::ValidatorScore(_) => EventType::ValidatorScoreEvent,
            Self::ValidatorRanking(_) => EventType::ValidatorRankingEvent,
            Self::KeyRotation(_) => EventType::KeyRotationEvent,
        }
    }
}

/// A domain event as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    trace_id: String,
    payload: EventPayload,
}

impl Event {
    /// Create an event tagged with the trace id of the producing transaction.
    #[must_use]
    pub fn new(trace_id: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            trace_id: trace_id.into(),
            payload,
        }
    }

    /// Shorthand for a time update event.
    #[must_use]
    pub fn time_update(trace_id: impl Into<String>, time: Timestamp) -> Self {
        Self::new(trace_id, EventPayload::TimeUpdate(time))
    }

    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }

    #[must_use]
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    #[must_use]
    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    #[must_use]
    pub fn into_payload(self) -> EventPayload {
        self.payload
    }

    /// The market this event relates to, if any.
    #[must_use]
    pub fn market_id(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Order(o) => Some(&o.market_id),
            EventPayload::Trade(t) => Some(&t.market_id),
            EventPayload::MarketCreated(m) | EventPayload::MarketUpdated(m) => Some(&m.id),
            EventPayload::MarketData(md) => Some(&md.market_id),
            EventPayload::RiskFactor(rf) => Some(&rf.market_id),
            EventPayload::Account(a) if !a.market_id.is_empty() => Some(&a.market_id),
            _ => None,
        }
    }

    /// The parties this event relates to.
    #[must_use]
    pub fn party_ids(&self) -> Vec<&str> {
        match &self.payload {
            EventPayload::Order(o) => vec![o.party_id.as_str()],
            EventPayload::Trade(t) => vec![t.buyer.as_str(), t.seller.as_str()],
            EventPayload::Account(a) => vec![a.owner.as_str()],
            EventPayload::Party(p) => vec![p.id.as_str()],
            EventPayload::Transfer(t) => vec![t.from.as_str(), t.to.as_str()],
            EventPayload::Proposal(p) => vec![p.party_id.as_str()],
            EventPayload::Vote(v) => vec![v.party_id.as_str()],
            EventPayload::DelegationBalance(d) => vec![d.party_id.as_str()],
            _ => Vec::new(),
        }
    }

    /// Block time carried by a time update.
    #[must_use]
    pub fn time(&self) -> Option<Timestamp> {
        match self.payload {
            EventPayload::TimeUpdate(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_mapping() {
        let event = Event::new("tx-1", EventPayload::Order(Order::default()));
        assert_eq!(event.event_type(), EventType::OrderEvent);
        assert_eq!(event.trace_id(), "tx-1");

        let time = Event::time_update("tx-2", 42);
        assert_eq!(time.event_type(), EventType::TimeUpdate);
        assert_eq!(time.time(), Some(42));
    }

    #[test]
    fn test_market_id_extraction() {
        let trade = Trade {
            market_id: "BTC/USD".into(),
            ..Trade::default()
        };
        let event = Event::new("tx", EventPayload::Trade(trade));
        assert_eq!(event.market_id(), Some("BTC/USD"));

        let vote = Event::new("tx", EventPayload::Vote(Vote::default()));
        assert_eq!(vote.market_id(), None);
    }

    #[test]
    fn test_party_ids_for_trade() {
        let trade = Trade {
            buyer: "alice".into(),
            seller: "bob".into(),
            ..Trade::default()
        };
        let event = Event::new("tx", EventPayload::Trade(trade));
        assert_eq!(event.party_ids(), vec!["alice", "bob"]);
    }

    #[test]
    fn test_event_type_labels_are_unique() {
        use std::collections::HashSet;
        let all = [
            EventType::All,
            EventType::TimeUpdate,
            EventType::OrderEvent,
            EventType::TradeEvent,
            EventType::AccountEvent,
            EventType::PartyEvent,
            EventType::MarketCreatedEvent,
            EventType::MarketUpdatedEvent,
            EventType::MarketDataEvent,
            EventType::RiskFactorEvent,
            EventType::ProposalEvent,
            EventType::VoteEvent,
            EventType::DelegationBalanceEvent,
            EventType::EpochUpdate,
            EventType::ValidatorUpdateEvent,
            EventType::ValidatorScoreEvent,
            EventType::ValidatorRankingEvent,
            EventType::KeyRotationEvent,
            EventType::CheckpointEvent,
            EventType::TransferEvent,
            EventType::TransferResponses,
            EventType::NetworkParameterEvent,
        ];
        let labels: HashSet<_> = all.iter().map(|t| t.as_str()).collect();
        assert_eq!(labels.len(), all.len());
    }
}
