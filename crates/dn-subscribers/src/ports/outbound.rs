//! Outbound (Driven) ports: read-side stores.
//!
//! Buffering subscribers call a `save_batch` method once per flush;
//! immediate subscribers call an upsert method per event. Every store must
//! accept concurrent calls from different subscriber tasks.
//!
//! Failures are reported back but never retried by the caller: the event is
//! already consumed from the bus.

use shared_types::entities::{
    Account, Candle, Checkpoint, Delegation, Epoch, KeyRotation, LedgerEntry, Market, MarketData,
    Node, Order, Party, RiskFactor, Trade, Transfer, ValidatorRanking, ValidatorScore,
};
use shared_types::errors::StoreResult;

pub trait OrderStore: Send + Sync {
    fn save_batch(&self, orders: Vec<Order>) -> StoreResult<()>;
}

pub trait TradeStore: Send + Sync {
    fn save_batch(&self, trades: Vec<Trade>) -> StoreResult<()>;
}

pub trait PartyStore: Send + Sync {
    fn save_batch(&self, parties: Vec<Party>) -> StoreResult<()>;
}

pub trait AccountStore: Send + Sync {
    fn save_batch(&self, accounts: Vec<Account>) -> StoreResult<()>;
}

pub trait MarketStore: Send + Sync {
    fn save_batch(&self, markets: Vec<Market>) -> StoreResult<()>;
}

pub trait MarketDataStore: Send + Sync {
    fn save_batch(&self, data: Vec<MarketData>) -> StoreResult<()>;
}

pub trait RiskFactorStore: Send + Sync {
    fn save_batch(&self, factors: Vec<RiskFactor>) -> StoreResult<()>;
}

pub trait CandleStore: Send + Sync {
    fn save_batch(&self, candles: Vec<Candle>) -> StoreResult<()>;
}

/// Ledger movements and the balances they produced.
pub trait TransferResponseStore: Send + Sync {
    fn save_batch(&self, entries: Vec<LedgerEntry>, balances: Vec<Account>) -> StoreResult<()>;
}

pub trait DelegationStore: Send + Sync {
    fn add_delegation(&self, delegation: Delegation) -> StoreResult<()>;
}

pub trait TransferStore: Send + Sync {
    fn add_transfer(&self, transfer: Transfer) -> StoreResult<()>;
}

pub trait EpochStore: Send + Sync {
    fn add_epoch(&self, epoch: Epoch) -> StoreResult<()>;
}

pub trait CheckpointStore: Send + Sync {
    fn save(&self, checkpoint: Checkpoint) -> StoreResult<()>;
}

/// Validator node records.
pub trait NodeStore: Send + Sync {
    /// Insert or replace a node.
    fn add_node(&self, node: Node) -> StoreResult<()>;

    /// Remove a node that left the validator set.
    fn remove_node(&self, node_id: &str) -> StoreResult<()>;

    fn add_node_reward_score(&self, score: ValidatorScore) -> StoreResult<()>;

    fn add_node_ranking_score(&self, ranking: ValidatorRanking) -> StoreResult<()>;

    fn update_public_key(&self, rotation: KeyRotation) -> StoreResult<()>;
}
