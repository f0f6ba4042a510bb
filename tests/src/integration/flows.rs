//! # Broker to Store Flows
//!
//! Events published on the broker reach every subscriber routed for them,
//! buffering subscribers persist on the next time update, query subscribers
//! serve the resulting views.
//!
//! ```text
//!   InMemoryBroker ──► OrderSub ──────────► RecordingStore<Order>
//!                 ├──► CandleSub ─────────► RecordingStore<Candle>
//!                 ├──► MarketDepthBuilder ► get_market_depth()
//!                 ├──► GovernanceDataSub ─► proposal_by_id()
//!                 └──► NodesSub ──────────► MemoryNodeStore + get_node_by_id()
//! ```

#[cfg(test)]
mod tests {
    use super::super::{active_order, event, tick, wait_for};
    use dn_subscribers::adapters::{MemoryNodeStore, RecordingStore};
    use dn_subscribers::{
        CandleSub, GovernanceDataSub, MarketDepthBuilder, NodeQuery, NodesSub, OrderSub,
        SubscriberConfig, TradeSub,
    };
    use shared_bus::{Broker, CancellationToken, EventPayload, EventPublisher, InMemoryBroker};
    use shared_types::entities::{
        Candle, Order, OrderStatus, Proposal, ProposalState, Side, Trade, ValidatorUpdate, Vote,
        VoteValue,
    };
    use std::sync::Arc;

    const MINUTE: i64 = 60_000_000_000;

    // =========================================================================
    // BUFFERING SUBSCRIBERS
    // =========================================================================

    #[tokio::test]
    async fn test_loop_subscriber_flushes_on_time_update() {
        let ctx = CancellationToken::new();
        let broker = InMemoryBroker::new();
        let store = Arc::new(RecordingStore::<Order>::new());
        broker.subscribe(OrderSub::new(&ctx, Arc::clone(&store), SubscriberConfig::default()));

        broker
            .send_batch(vec![
                event(EventPayload::Order(active_order("o1", "m1", Side::Buy, 100, 5))),
                event(EventPayload::Order(active_order("o2", "m1", Side::Sell, 110, 3))),
            ])
            .await;
        assert!(store.records().is_empty());

        broker.send(tick(1)).await;
        assert!(wait_for(|| store.records().len() == 2).await);
        let ids: Vec<_> = store.records().into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["o1", "o2"]);
    }

    #[tokio::test]
    async fn test_store_failure_drops_batch_and_keeps_running() {
        let ctx = CancellationToken::new();
        let broker = InMemoryBroker::new();
        let store = Arc::new(RecordingStore::<Trade>::new());
        broker.subscribe(TradeSub::new(&ctx, Arc::clone(&store), SubscriberConfig::ack()));

        store.set_failing(true);
        broker
            .send(event(EventPayload::Trade(Trade {
                id: "t1".into(),
                ..Trade::default()
            })))
            .await;
        broker.send(tick(1)).await;
        assert_eq!(store.batch_count(), 0);

        store.set_failing(false);
        broker
            .send(event(EventPayload::Trade(Trade {
                id: "t2".into(),
                ..Trade::default()
            })))
            .await;
        broker.send(tick(2)).await;
        let ids: Vec<_> = store.records().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["t2"]);
    }

    #[tokio::test]
    async fn test_candles_from_trades() {
        let ctx = CancellationToken::new();
        let broker = InMemoryBroker::new();
        let store = Arc::new(RecordingStore::<Candle>::new());
        broker.subscribe(CandleSub::with_intervals(
            &ctx,
            Arc::clone(&store),
            vec![MINUTE],
            SubscriberConfig::ack(),
        ));

        for (price, size, ts) in [(100, 1, 10), (120, 2, 20), (90, 3, 30)] {
            broker
                .send(event(EventPayload::Trade(Trade {
                    market_id: "m1".into(),
                    price,
                    size,
                    timestamp: ts,
                    ..Trade::default()
                })))
                .await;
        }
        broker.send(tick(40)).await;

        let candles = store.records();
        assert_eq!(candles.len(), 1);
        let candle = &candles[0];
        assert_eq!((candle.open, candle.high, candle.low, candle.close), (100, 120, 90, 90));
        assert_eq!(candle.volume, 6);
        assert_eq!(candle.start, 0);
    }

    // =========================================================================
    // QUERY SUBSCRIBERS
    // =========================================================================

    #[tokio::test]
    async fn test_market_depth_tracks_book() {
        let ctx = CancellationToken::new();
        let broker = InMemoryBroker::new();
        let depth = MarketDepthBuilder::new(&ctx, SubscriberConfig::ack());
        broker.subscribe(depth.clone());

        for order in [
            active_order("b1", "m1", Side::Buy, 100, 5),
            active_order("b2", "m1", Side::Buy, 101, 2),
            active_order("s1", "m1", Side::Sell, 105, 4),
        ] {
            broker.send(event(EventPayload::Order(order))).await;
        }
        let mut cancelled = active_order("b2", "m1", Side::Buy, 101, 2);
        cancelled.status = OrderStatus::Cancelled;
        broker.send(event(EventPayload::Order(cancelled))).await;

        let book = depth.get_market_depth("m1", 0);
        let buys: Vec<_> = book.buy.iter().map(|l| (l.price, l.volume)).collect();
        let sells: Vec<_> = book.sell.iter().map(|l| (l.price, l.volume)).collect();
        assert_eq!(buys, vec![(100, 5)]);
        assert_eq!(sells, vec![(105, 4)]);
        assert_eq!(depth.best_bid_price("m1"), 100);
    }

    #[tokio::test]
    async fn test_governance_view() {
        let ctx = CancellationToken::new();
        let broker = InMemoryBroker::new();
        let governance = GovernanceDataSub::new(&ctx, SubscriberConfig::ack());
        broker.subscribe(governance.clone());

        broker
            .send(event(EventPayload::Proposal(Proposal {
                id: "p1".into(),
                party_id: "alice".into(),
                state: ProposalState::Open,
                ..Proposal::default()
            })))
            .await;
        for (party, value) in [("bob", VoteValue::Yes), ("carol", VoteValue::No), ("bob", VoteValue::Yes)] {
            broker
                .send(event(EventPayload::Vote(Vote {
                    party_id: party.into(),
                    proposal_id: "p1".into(),
                    value,
                    ..Vote::default()
                })))
                .await;
        }

        let all = governance.proposal_by_id("p1", false).unwrap();
        assert_eq!(all.yes.len(), 2);
        let unique = governance.proposal_by_id("p1", true).unwrap();
        assert_eq!(unique.yes.len(), 1);
        assert_eq!(unique.no.len(), 1);
        assert!(governance.proposal_by_id("p2", false).is_none());
    }

    #[tokio::test]
    async fn test_nodes_persisted_and_queryable() {
        let ctx = CancellationToken::new();
        let broker = InMemoryBroker::new();
        let store = Arc::new(MemoryNodeStore::new());
        let nodes = NodesSub::new(&ctx, Arc::clone(&store), SubscriberConfig::ack());
        broker.subscribe(nodes.clone());

        broker
            .send(event(EventPayload::ValidatorUpdate(ValidatorUpdate {
                node_id: "n1".into(),
                pub_key: "pk1".into(),
                added: true,
                ..ValidatorUpdate::default()
            })))
            .await;

        assert_eq!(nodes.get_node_by_id("n1").map(|n| n.pub_key), Some("pk1".into()));
        assert_eq!(store.get("n1").map(|n| n.pub_key), Some("pk1".into()));
        assert_eq!(nodes.get_nodes().len(), 1);
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    #[tokio::test]
    async fn test_cancelled_context_unregisters_subscribers() {
        let ctx = CancellationToken::new();
        let broker = InMemoryBroker::new();
        let store = Arc::new(RecordingStore::<Order>::new());
        broker.subscribe(OrderSub::new(&ctx, Arc::clone(&store), SubscriberConfig::default()));
        assert_eq!(broker.subscriber_count(), 1);

        ctx.cancel();
        broker
            .send(event(EventPayload::Order(active_order("o1", "m1", Side::Buy, 1, 1))))
            .await;
        assert!(wait_for(|| broker.subscriber_count() == 0).await);
    }

    #[tokio::test]
    async fn test_cancelled_ack_subscriber_stops_persisting() {
        let ctx = CancellationToken::new();
        let broker = InMemoryBroker::new();
        let store = Arc::new(RecordingStore::<Order>::new());
        broker.subscribe(OrderSub::new(&ctx, Arc::clone(&store), SubscriberConfig::ack()));

        ctx.cancel();
        broker
            .send_batch(vec![
                event(EventPayload::Order(active_order("o1", "m1", Side::Buy, 1, 1))),
                tick(1),
            ])
            .await;

        assert!(store.records().is_empty());
        assert_eq!(broker.subscriber_count(), 0);
    }
}
