//! In-memory stores.
//!
//! `RecordingStore<T>` keeps every batch it receives, in call order, and can
//! be switched into a failing mode to exercise the error path.

use crate::ports::outbound::{
    AccountStore, CandleStore, CheckpointStore, DelegationStore, EpochStore, MarketDataStore,
    MarketStore, NodeStore, OrderStore, PartyStore, RiskFactorStore, TradeStore, TransferStore,
    TransferResponseStore,
};
use parking_lot::{Mutex, RwLock};
use shared_types::entities::{
    Account, Candle, Checkpoint, Delegation, Epoch, KeyRotation, LedgerEntry, Market, MarketData,
    Node, Order, Party, RiskFactor, Trade, Transfer, TransferResponse, ValidatorRanking,
    ValidatorScore,
};
use shared_types::errors::{StoreError, StoreResult};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Store that records every write.
pub struct RecordingStore<T> {
    batches: Mutex<Vec<Vec<T>>>,
    failing: AtomicBool,
}

impl<T: Clone> RecordingStore<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make subsequent writes fail with a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All batches received, in call order.
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<T>> {
        self.batches.lock().clone()
    }

    /// All records received, flattened.
    #[must_use]
    pub fn records(&self) -> Vec<T> {
        self.batches.lock().iter().flatten().cloned().collect()
    }

    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }

    fn record(&self, batch: Vec<T>) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected failure".to_string()));
        }
        self.batches.lock().push(batch);
        Ok(())
    }
}

impl<T: Clone> Default for RecordingStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! batch_store {
    ($($store:ident => $ty:ty),* $(,)?) => {
        $(
            impl $store for RecordingStore<$ty> {
                fn save_batch(&self, batch: Vec<$ty>) -> StoreResult<()> {
                    self.record(batch)
                }
            }
        )*
    };
}

batch_store! {
    OrderStore => Order,
    TradeStore => Trade,
    PartyStore => Party,
    AccountStore => Account,
    MarketStore => Market,
    MarketDataStore => MarketData,
    RiskFactorStore => RiskFactor,
    CandleStore => Candle,
}

impl TransferResponseStore for RecordingStore<TransferResponse> {
    fn save_batch(&self, entries: Vec<LedgerEntry>, balances: Vec<Account>) -> StoreResult<()> {
        self.record(vec![TransferResponse {
            transfers: entries,
            balances,
        }])
    }
}

impl DelegationStore for RecordingStore<Delegation> {
    fn add_delegation(&self, delegation: Delegation) -> StoreResult<()> {
        self.record(vec![delegation])
    }
}

impl TransferStore for RecordingStore<Transfer> {
    fn add_transfer(&self, transfer: Transfer) -> StoreResult<()> {
        self.record(vec![transfer])
    }
}

impl EpochStore for RecordingStore<Epoch> {
    fn add_epoch(&self, epoch: Epoch) -> StoreResult<()> {
        self.record(vec![epoch])
    }
}

impl CheckpointStore for RecordingStore<Checkpoint> {
    fn save(&self, checkpoint: Checkpoint) -> StoreResult<()> {
        self.record(vec![checkpoint])
    }
}

/// Keyed node table.
#[derive(Default)]
pub struct MemoryNodeStore {
    nodes: RwLock<BTreeMap<String, Node>>,
}

impl MemoryNodeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, node_id: &str) -> Option<Node> {
        self.nodes.read().get(node_id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    fn with_node(&self, node_id: &str, f: impl FnOnce(&mut Node)) -> StoreResult<()> {
        let mut nodes = self.nodes.write();
        let node = nodes
            .get_mut(node_id)
            .ok_or_else(|| StoreError::NotFound(node_id.to_string()))?;
        f(node);
        Ok(())
    }
}

impl NodeStore for MemoryNodeStore {
    fn add_node(&self, node: Node) -> StoreResult<()> {
        self.nodes.write().insert(node.id.clone(), node);
        Ok(())
    }

    fn remove_node(&self, node_id: &str) -> StoreResult<()> {
        self.nodes
            .write()
            .remove(node_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(node_id.to_string()))
    }

    fn add_node_reward_score(&self, score: ValidatorScore) -> StoreResult<()> {
        let node_id = score.node_id.clone();
        self.with_node(&node_id, |node| node.reward_scores.push(score))
    }

    fn add_node_ranking_score(&self, ranking: ValidatorRanking) -> StoreResult<()> {
        let node_id = ranking.node_id.clone();
        self.with_node(&node_id, |node| node.ranking_scores.push(ranking))
    }

    fn update_public_key(&self, rotation: KeyRotation) -> StoreResult<()> {
        self.with_node(&rotation.node_id, |node| node.pub_key = rotation.new_pub_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_store_keeps_batches() {
        let store = RecordingStore::<Order>::new();
        OrderStore::save_batch(&store, vec![Order::default(), Order::default()]).unwrap();
        OrderStore::save_batch(&store, vec![Order::default()]).unwrap();

        assert_eq!(store.batch_count(), 2);
        assert_eq!(store.records().len(), 3);
    }

    #[test]
    fn test_recording_store_failure_mode() {
        let store = RecordingStore::<Trade>::new();
        store.set_failing(true);
        assert!(TradeStore::save_batch(&store, vec![Trade::default()]).is_err());
        assert_eq!(store.batch_count(), 0);
    }

    #[test]
    fn test_node_store_scores_require_node() {
        let store = MemoryNodeStore::new();
        let score = ValidatorScore {
            node_id: "n1".into(),
            ..ValidatorScore::default()
        };
        assert_eq!(
            store.add_node_reward_score(score.clone()),
            Err(StoreError::NotFound("n1".into()))
        );

        store
            .add_node(Node {
                id: "n1".into(),
                ..Node::default()
            })
            .unwrap();
        store.add_node_reward_score(score).unwrap();
        assert_eq!(store.get("n1").unwrap().reward_scores.len(), 1);
    }
}
