//! Validator nodes subscriber.
//!
//! Persists every validator registration, score, ranking and key rotation as
//! it arrives, and keeps a node view for synchronous lookups from other
//! tasks.

use super::{log_store_error, misrouted};
use crate::config::SubscriberConfig;
use crate::ports::inbound::NodeQuery;
use crate::ports::outbound::NodeStore;
use parking_lot::RwLock;
use shared_bus::{spawn_loop, Base, Event, EventBatch, EventPayload, EventType, Subscriber};
use shared_types::entities::{Node, ValidatorUpdate};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub struct NodesSub<S: NodeStore> {
    base: Base,
    store: Arc<S>,
    nodes: RwLock<BTreeMap<String, Node>>,
}

impl<S: NodeStore + 'static> NodesSub<S> {
    pub fn new(ctx: &CancellationToken, store: Arc<S>, config: SubscriberConfig) -> Arc<Self> {
        let sub = Arc::new(Self {
            base: Base::new(ctx, config.buffer_size, config.ack),
            store,
            nodes: RwLock::new(BTreeMap::new()),
        });
        spawn_loop(&sub);
        sub
    }

    fn on_validator_update(&self, event: &Event, update: &ValidatorUpdate) {
        if !update.added {
            self.nodes.write().remove(&update.node_id);
            log_store_error(self.name(), event, self.store.remove_node(&update.node_id));
            return;
        }

        let node = {
            let mut nodes = self.nodes.write();
            let node = nodes.entry(update.node_id.clone()).or_default();
            node.id = update.node_id.clone();
            node.pub_key = update.pub_key.clone();
            node.tm_pub_key = update.tm_pub_key.clone();
            node.ethereum_address = update.ethereum_address.clone();
            node.info_url = update.info_url.clone();
            node.location = update.country.clone();
            node.name = update.name.clone();
            node.avatar_url = update.avatar_url.clone();
            node.clone()
        };
        log_store_error(self.name(), event, self.store.add_node(node));
    }

    fn handle(&self, event: &Event) {
        match event.payload() {
            EventPayload::ValidatorUpdate(update) => self.on_validator_update(event, update),
            EventPayload::ValidatorScore(score) => {
                match self.nodes.write().get_mut(&score.node_id) {
                    Some(node) => {
                        node.reward_scores.retain(|s| s.epoch_seq != score.epoch_seq);
                        node.reward_scores.push(score.clone());
                    }
                    None => warn!(node_id = %score.node_id, "Score for unknown node"),
                }
                let result = self.store.add_node_reward_score(score.clone());
                log_store_error(self.name(), event, result);
            }
            EventPayload::ValidatorRanking(ranking) => {
                match self.nodes.write().get_mut(&ranking.node_id) {
                    Some(node) => {
                        node.ranking_scores.retain(|r| r.epoch_seq != ranking.epoch_seq);
                        node.ranking_scores.push(ranking.clone());
                    }
                    None => warn!(node_id = %ranking.node_id, "Ranking for unknown node"),
                }
                let result = self.store.add_node_ranking_score(ranking.clone());
                log_store_error(self.name(), event, result);
            }
            EventPayload::KeyRotation(rotation) => {
                if let Some(node) = self.nodes.write().get_mut(&rotation.node_id) {
                    node.pub_key = rotation.new_pub_key.clone();
                }
                let result = self.store.update_public_key(rotation.clone());
                log_store_error(self.name(), event, result);
            }
            _ => misrouted(self.name(), event),
        }
    }
}

impl<S: NodeStore + 'static> Subscriber for NodesSub<S> {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        vec![
            EventType::ValidatorUpdateEvent,
            EventType::ValidatorScoreEvent,
            EventType::ValidatorRankingEvent,
            EventType::KeyRotationEvent,
        ]
    }

    fn push(&self, events: EventBatch) {
        for event in &events {
            self.handle(event);
        }
    }

    fn name(&self) -> &'static str {
        "nodes"
    }
}

impl<S: NodeStore + 'static> NodeQuery for NodesSub<S> {
    fn get_node_by_id(&self, node_id: &str) -> Option<Node> {
        self.nodes.read().get(node_id).cloned()
    }

    fn get_nodes(&self) -> Vec<Node> {
        self.nodes.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryNodeStore;
    use crate::subscribers::test_support::{ev, tick};
    use shared_types::entities::{KeyRotation, ValidatorRanking, ValidatorScore};

    fn setup() -> (Arc<MemoryNodeStore>, Arc<NodesSub<MemoryNodeStore>>) {
        let ctx = CancellationToken::new();
        let store = Arc::new(MemoryNodeStore::new());
        let sub = NodesSub::new(&ctx, store.clone(), SubscriberConfig::ack());
        (store, sub)
    }

    fn added(id: &str, key: &str) -> Event {
        ev(EventPayload::ValidatorUpdate(ValidatorUpdate {
            node_id: id.into(),
            pub_key: key.into(),
            added: true,
            ..ValidatorUpdate::default()
        }))
    }

    #[test]
    fn test_validator_update_adds_node() {
        let (store, sub) = setup();
        sub.push(vec![added("n2", "k2"), added("n1", "k1")]);

        assert_eq!(store.len(), 2);
        let ids: Vec<_> = sub.get_nodes().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["n1", "n2"]);
    }

    #[test]
    fn test_scores_and_rankings_attached() {
        let (store, sub) = setup();
        sub.push(vec![
            added("n1", "k1"),
            ev(EventPayload::ValidatorScore(ValidatorScore {
                node_id: "n1".into(),
                epoch_seq: 1,
                validator_score: 0.5,
                ..ValidatorScore::default()
            })),
            ev(EventPayload::ValidatorRanking(ValidatorRanking {
                node_id: "n1".into(),
                epoch_seq: 1,
                ranking_score: 0.9,
                ..ValidatorRanking::default()
            })),
        ]);

        let node = sub.get_node_by_id("n1").unwrap();
        assert_eq!(node.reward_scores.len(), 1);
        assert_eq!(node.ranking_scores.len(), 1);
        assert_eq!(store.get("n1").unwrap().ranking_scores.len(), 1);
    }

    #[test]
    fn test_key_rotation() {
        let (store, sub) = setup();
        sub.push(vec![
            added("n1", "old"),
            ev(EventPayload::KeyRotation(KeyRotation {
                node_id: "n1".into(),
                old_pub_key: "old".into(),
                new_pub_key: "new".into(),
                block_height: 10,
            })),
        ]);

        assert_eq!(sub.get_node_by_id("n1").unwrap().pub_key, "new");
        assert_eq!(store.get("n1").unwrap().pub_key, "new");
    }

    #[test]
    fn test_removed_validator() {
        let (store, sub) = setup();
        sub.push(vec![added("n1", "k1")]);
        sub.push(vec![ev(EventPayload::ValidatorUpdate(ValidatorUpdate {
            node_id: "n1".into(),
            added: false,
            ..ValidatorUpdate::default()
        }))]);

        assert!(sub.get_node_by_id("n1").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_score_for_unknown_node_logged() {
        let (store, sub) = setup();
        sub.push(vec![ev(EventPayload::ValidatorScore(ValidatorScore {
            node_id: "ghost".into(),
            ..ValidatorScore::default()
        }))]);
        assert!(sub.get_nodes().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    #[should_panic(expected = "unexpected event type")]
    fn test_misrouted_event_panics() {
        let (_store, sub) = setup();
        sub.push(vec![tick(1)]);
    }
}
