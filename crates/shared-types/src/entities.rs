//! # Core Domain Entities
//!
//! Trading-platform records carried by bus events and written to the
//! read-side stores.
//!
//! ## Clusters
//!
//! - **Trading**: `Order`, `Trade`, `Candle`, `Market`, `MarketData`, `RiskFactor`
//! - **Collateral**: `Account`, `Party`, `Transfer`, `LedgerEntry`
//! - **Governance**: `Proposal`, `Vote`, `NetworkParameter`
//! - **Staking & Validators**: `Delegation`, `Epoch`, `ValidatorUpdate`,
//!   `ValidatorScore`, `ValidatorRanking`, `KeyRotation`, `Node`
//! - **Chain**: `Checkpoint`

use serde::{Deserialize, Serialize};

// Re-export U256 from primitive-types for amounts that exceed u64
pub use primitive_types::U256;

/// Unix timestamp in nanoseconds.
pub type Timestamp = i64;

/// Market identifier.
pub type MarketId = String;

/// Party (public key) identifier.
pub type PartyId = String;

// =============================================================================
// CLUSTER A: TRADING
// =============================================================================

/// Side of the order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Side {
    #[default]
    Unspecified,
    Buy,
    Sell,
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Unspecified,
    Active,
    Expired,
    Cancelled,
    Stopped,
    Filled,
    Rejected,
    PartiallyFilled,
    Parked,
}

impl OrderStatus {
    /// Statuses after which an order no longer rests on the book.
    #[must_use]
    pub fn leaves_book(self) -> bool {
        matches!(
            self,
            Self::Cancelled
                | Self::Expired
                | Self::Stopped
                | Self::Filled
                | Self::PartiallyFilled
                | Self::Parked
        )
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderType {
    #[default]
    Limit,
    Market,
    Network,
}

/// Time in force for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimeInForce {
    #[default]
    Gtc,
    Gtt,
    Ioc,
    Fok,
    Gfa,
    Gfn,
}

/// An order as emitted by the matching engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Order {
    pub id: String,
    pub market_id: MarketId,
    pub party_id: PartyId,
    pub side: Side,
    pub price: u64,
    pub size: u64,
    pub remaining: u64,
    pub time_in_force: TimeInForce,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub version: u64,
    pub reference: String,
}

impl Order {
    /// Orders that never rest on the book.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.order_type != OrderType::Market
            && self.time_in_force != TimeInForce::Fok
            && self.time_in_force != TimeInForce::Ioc
    }
}

/// A trade between two parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Trade {
    pub id: String,
    pub market_id: MarketId,
    pub price: u64,
    pub size: u64,
    pub buyer: PartyId,
    pub seller: PartyId,
    pub aggressor: Side,
    pub buy_order: String,
    pub sell_order: String,
    pub timestamp: Timestamp,
}

/// Market trading mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TradingMode {
    #[default]
    Unspecified,
    Continuous,
    BatchAuction,
    OpeningAuction,
    MonitoringAuction,
    NoTrading,
}

/// Market definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Market {
    pub id: MarketId,
    pub code: String,
    pub name: String,
    pub settlement_asset: String,
    pub decimal_places: u32,
    pub trading_mode: TradingMode,
}

/// Point-in-time market data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MarketData {
    pub market_id: MarketId,
    pub mark_price: u64,
    pub best_bid_price: u64,
    pub best_bid_volume: u64,
    pub best_offer_price: u64,
    pub best_offer_volume: u64,
    pub open_interest: u64,
    pub trading_mode: TradingMode,
    pub timestamp: Timestamp,
}

/// OHLCV candle aggregated from trades over one interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Candle {
    pub market_id: MarketId,
    /// Interval length in nanoseconds.
    pub interval: i64,
    /// Bucket start, aligned to `interval`.
    pub start: Timestamp,
    pub open: u64,
    pub high: u64,
    pub low: u64,
    pub close: u64,
    pub volume: u64,
    pub last_update: Timestamp,
}

/// Risk factors for a market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RiskFactor {
    pub market_id: MarketId,
    pub short: f64,
    pub long: f64,
}

// =============================================================================
// CLUSTER B: COLLATERAL
// =============================================================================

/// Account type in the collateral engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AccountType {
    #[default]
    Unspecified,
    General,
    Margin,
    Settlement,
    Insurance,
    FeesInfrastructure,
    FeesMaker,
    Bond,
}

/// A collateral account balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Account {
    pub id: String,
    pub owner: PartyId,
    pub asset: String,
    pub market_id: MarketId,
    pub account_type: AccountType,
    pub balance: U256,
}

/// A party known to the network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Party {
    pub id: PartyId,
}

/// Status of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TransferStatus {
    #[default]
    Pending,
    Done,
    Rejected,
    Stopped,
    Cancelled,
}

/// A one-off or recurring transfer between accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Transfer {
    pub id: String,
    pub from: PartyId,
    pub from_account_type: AccountType,
    pub to: PartyId,
    pub to_account_type: AccountType,
    pub asset: String,
    pub amount: U256,
    pub reference: String,
    pub status: TransferStatus,
    pub timestamp: Timestamp,
}

/// A single ledger movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LedgerEntry {
    pub from_account: String,
    pub to_account: String,
    pub amount: U256,
    pub reference: String,
    pub timestamp: Timestamp,
}

/// Ledger movements and resulting balances of one collateral operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TransferResponse {
    pub transfers: Vec<LedgerEntry>,
    pub balances: Vec<Account>,
}

// =============================================================================
// CLUSTER C: GOVERNANCE
// =============================================================================

/// Proposal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProposalState {
    #[default]
    Unspecified,
    Failed,
    Open,
    Passed,
    Rejected,
    Declined,
    Enacted,
    WaitingForNodeVote,
}

/// A governance proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Proposal {
    pub id: String,
    pub reference: String,
    pub party_id: PartyId,
    pub state: ProposalState,
    pub timestamp: Timestamp,
    pub closing_timestamp: Timestamp,
    pub enactment_timestamp: Timestamp,
}

/// Value of a governance vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VoteValue {
    #[default]
    Unspecified,
    No,
    Yes,
}

/// A vote cast by a party on a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Vote {
    pub party_id: PartyId,
    pub proposal_id: String,
    pub value: VoteValue,
    pub timestamp: Timestamp,
}

/// A network parameter change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NetworkParameter {
    pub key: String,
    pub value: String,
}

// =============================================================================
// CLUSTER D: STAKING & VALIDATORS
// =============================================================================

/// Stake delegated by a party to a node for an epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Delegation {
    pub party_id: PartyId,
    pub node_id: String,
    pub epoch_seq: u64,
    pub amount: U256,
}

/// Epoch lifecycle action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EpochAction {
    #[default]
    Unspecified,
    Start,
    End,
}

/// Epoch boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Epoch {
    pub seq: u64,
    pub start_time: Timestamp,
    pub expire_time: Timestamp,
    pub end_time: Timestamp,
    pub action: EpochAction,
}

/// Validator registration or removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValidatorUpdate {
    pub node_id: String,
    pub pub_key: String,
    pub ethereum_address: String,
    pub tm_pub_key: String,
    pub info_url: String,
    pub country: String,
    pub name: String,
    pub avatar_url: String,
    pub epoch_seq: u64,
    /// `false` when the validator is being removed.
    pub added: bool,
}

/// Reward score of a validator for an epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ValidatorScore {
    pub node_id: String,
    pub epoch_seq: u64,
    pub validator_score: f64,
    pub normalised_score: f64,
    pub raw_validator_score: f64,
    pub performance_score: f64,
    pub multisig_score: f64,
    pub validator_status: String,
}

/// Ranking of a validator for an epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ValidatorRanking {
    pub node_id: String,
    pub epoch_seq: u64,
    pub stake_score: f64,
    pub performance_score: f64,
    pub ranking_score: f64,
    pub previous_status: String,
    pub next_status: String,
    pub voting_power: u32,
}

/// Validator key rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct KeyRotation {
    pub node_id: String,
    pub old_pub_key: String,
    pub new_pub_key: String,
    pub block_height: u64,
}

/// Read-side view of a validator node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Node {
    pub id: String,
    pub pub_key: String,
    pub tm_pub_key: String,
    pub ethereum_address: String,
    pub info_url: String,
    pub location: String,
    pub name: String,
    pub avatar_url: String,
    /// Reward scores, one per epoch.
    pub reward_scores: Vec<ValidatorScore>,
    /// Ranking scores, one per epoch.
    pub ranking_scores: Vec<ValidatorRanking>,
}

// =============================================================================
// CLUSTER E: CHAIN
// =============================================================================

/// A state checkpoint taken by the core node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Checkpoint {
    pub hash: String,
    pub block_hash: String,
    pub block_height: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_leaves_book() {
        assert!(OrderStatus::Filled.leaves_book());
        assert!(OrderStatus::Parked.leaves_book());
        assert!(!OrderStatus::Active.leaves_book());
        assert!(!OrderStatus::Rejected.leaves_book());
    }

    #[test]
    fn test_order_persistence() {
        let mut order = Order::default();
        assert!(order.is_persistent());

        order.time_in_force = TimeInForce::Ioc;
        assert!(!order.is_persistent());

        order.time_in_force = TimeInForce::Gtc;
        order.order_type = OrderType::Market;
        assert!(!order.is_persistent());
    }
}
