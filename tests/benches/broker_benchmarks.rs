//! # Data Node Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | Broker | fan-out of one batch to N ack subscribers |
//! | Market depth | order updates into a single book |
//! | Network parameters | validate / update / state hash |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dn_netparams::keys::{MARKET_FEE_FACTORS_MAKER_FEE, VALIDATORS_EPOCH_LENGTH};
use dn_netparams::Store;
use dn_subscribers::{MarketDepthBuilder, SubscriberConfig};
use shared_bus::{Broker, CancellationToken, Event, EventPayload, EventPublisher, InMemoryBroker};
use shared_types::entities::{Order, OrderStatus, Side};
use std::time::Duration;
use tokio::runtime::Runtime;

fn order(i: u64) -> Order {
    Order {
        id: format!("o{}", i % 512),
        market_id: "m1".into(),
        party_id: "bench".into(),
        side: if i % 2 == 0 { Side::Buy } else { Side::Sell },
        price: 1_000 + (i % 64),
        size: 10,
        remaining: 10,
        status: OrderStatus::Active,
        ..Order::default()
    }
}

fn order_batch(size: u64) -> Vec<Event> {
    (0..size)
        .map(|i| Event::new("bench", EventPayload::Order(order(i))))
        .collect()
}

// ============================================================================
// Broker
// ============================================================================

fn bench_broker_fan_out(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("broker-fan-out");
    group.measurement_time(Duration::from_secs(5));

    for subscribers in [1usize, 8, 32] {
        let ctx = CancellationToken::new();
        let broker = rt.block_on(async {
            let broker = InMemoryBroker::new();
            for _ in 0..subscribers {
                broker.subscribe(MarketDepthBuilder::new(&ctx, SubscriberConfig::ack()));
            }
            broker
        });
        let batch = order_batch(100);

        group.throughput(Throughput::Elements((subscribers * batch.len()) as u64));
        group.bench_with_input(
            BenchmarkId::new("send_batch_100", subscribers),
            &batch,
            |b, batch| b.iter(|| rt.block_on(broker.send_batch(black_box(batch.clone())))),
        );
        ctx.cancel();
    }

    group.finish();
}

// ============================================================================
// Market depth
// ============================================================================

fn bench_market_depth(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("market-depth");

    let ctx = CancellationToken::new();
    let (broker, depth) = rt.block_on(async {
        let broker = InMemoryBroker::new();
        let depth = MarketDepthBuilder::new(&ctx, SubscriberConfig::ack());
        broker.subscribe(depth.clone());
        (broker, depth)
    });
    rt.block_on(broker.send_batch(order_batch(1_000)));

    group.bench_function("order_update", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            rt.block_on(broker.send(Event::new("bench", EventPayload::Order(order(i)))))
        })
    });
    group.bench_function("get_market_depth", |b| {
        b.iter(|| black_box(depth.get_market_depth("m1", 0)))
    });

    ctx.cancel();
    group.finish();
}

// ============================================================================
// Network parameters
// ============================================================================

fn bench_netparams(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("netparams");
    let store = Store::new().unwrap();

    group.bench_function("validate_float", |b| {
        b.iter(|| black_box(store.validate(MARKET_FEE_FACTORS_MAKER_FEE, "0.0003").is_ok()))
    });
    group.bench_function("validate_duration_with_dependencies", |b| {
        b.iter(|| black_box(store.validate(VALIDATORS_EPOCH_LENGTH, "12h").is_ok()))
    });
    group.bench_function("update", |b| {
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let raw = if flip { "0.0003" } else { "0.0002" };
            rt.block_on(store.update(MARKET_FEE_FACTORS_MAKER_FEE, raw)).is_ok()
        })
    });
    group.bench_function("state_hash", |b| {
        b.iter(|| black_box(store.state_hash().is_ok()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_broker_fan_out,
    bench_market_depth,
    bench_netparams,
);

criterion_main!(benches);
