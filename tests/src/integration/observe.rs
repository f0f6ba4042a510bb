//! # Observe Streams
//!
//! `Service::observe_events` end to end: a stream subscriber registered on
//! the broker, filtered and batched, forwarded to a bounded receiver.

#[cfg(test)]
mod tests {
    use super::super::{active_order, event, tick, wait_for, WAIT};
    use dn_subscribers::{market_filter, party_filter, EventObserver, Service, SubscriberConfig};
    use shared_bus::{CancellationToken, EventPayload, EventPublisher, EventType, InMemoryBroker};
    use shared_types::entities::{Side, Trade};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn setup() -> (Arc<InMemoryBroker>, Service<InMemoryBroker>) {
        let broker = Arc::new(InMemoryBroker::new());
        let service = Service::new(Arc::clone(&broker), SubscriberConfig::default());
        (broker, service)
    }

    fn trade(market: &str, buyer: &str, seller: &str) -> shared_bus::Event {
        event(EventPayload::Trade(Trade {
            market_id: market.into(),
            buyer: buyer.into(),
            seller: seller.into(),
            ..Trade::default()
        }))
    }

    #[tokio::test]
    async fn test_filters_combine() {
        let (broker, service) = setup();
        let ctx = CancellationToken::new();
        let (mut rx, _sizes) = service.observe_events(
            &ctx,
            -1,
            vec![EventType::TradeEvent],
            0,
            vec![market_filter("m1"), party_filter("alice")],
        );

        broker.send(trade("m2", "alice", "bob")).await;
        broker.send(trade("m1", "carol", "bob")).await;
        broker.send(trade("m1", "bob", "alice")).await;

        let batch = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].market_id(), Some("m1"));
        assert!(batch[0].party_ids().contains(&"alice"));
    }

    #[tokio::test]
    async fn test_only_requested_types() {
        let (broker, service) = setup();
        let ctx = CancellationToken::new();
        let (mut rx, _sizes) =
            service.observe_events(&ctx, -1, vec![EventType::OrderEvent], 0, Vec::new());

        broker.send(tick(1)).await;
        broker.send(trade("m1", "a", "b")).await;
        broker
            .send(event(EventPayload::Order(active_order("o1", "m1", Side::Buy, 1, 1))))
            .await;

        let batch = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert!(batch.iter().all(|e| e.event_type() == EventType::OrderEvent));
    }

    #[tokio::test]
    async fn test_batch_size_holds_until_full() {
        let (broker, service) = setup();
        let ctx = CancellationToken::new();
        let (mut rx, _sizes) =
            service.observe_events(&ctx, -1, vec![EventType::TradeEvent], 3, Vec::new());

        broker.send(trade("m1", "a", "b")).await;
        broker.send(trade("m1", "a", "b")).await;
        assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_err());

        broker.send(trade("m1", "a", "b")).await;
        let batch = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(batch.len(), 3);
    }

    #[tokio::test]
    async fn test_batch_size_update_flushes_pending() {
        let (broker, service) = setup();
        let ctx = CancellationToken::new();
        let (mut rx, sizes) =
            service.observe_events(&ctx, -1, vec![EventType::TradeEvent], 10, Vec::new());

        broker.send(trade("m1", "a", "b")).await;
        broker.send(trade("m1", "a", "b")).await;
        assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_err());

        sizes.send(0).await.unwrap();
        let batch = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(batch.len(), 2);

        broker.send(trade("m1", "a", "b")).await;
        let batch = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_closes_stream_and_unsubscribes() {
        let (broker, service) = setup();
        let ctx = CancellationToken::new();
        let (mut rx, _sizes) =
            service.observe_events(&ctx, -1, vec![EventType::All], 0, Vec::new());
        assert_eq!(broker.subscriber_count(), 1);

        ctx.cancel();
        assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), None);
        assert!(wait_for(|| broker.subscriber_count() == 0).await);
    }

    #[tokio::test]
    async fn test_independent_observers() {
        let (broker, service) = setup();
        let ctx = CancellationToken::new();
        let (mut m1, _s1) =
            service.observe_events(&ctx, -1, vec![EventType::TradeEvent], 0, vec![market_filter("m1")]);
        let (mut m2, _s2) =
            service.observe_events(&ctx, -1, vec![EventType::TradeEvent], 0, vec![market_filter("m2")]);

        broker.send(trade("m1", "a", "b")).await;
        broker.send(trade("m2", "a", "b")).await;

        let first = timeout(WAIT, m1.recv()).await.unwrap().unwrap();
        let second = timeout(WAIT, m2.recv()).await.unwrap().unwrap();
        assert_eq!(first[0].market_id(), Some("m1"));
        assert_eq!(second[0].market_id(), Some("m2"));
    }
}
