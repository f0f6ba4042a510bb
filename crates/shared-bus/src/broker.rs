//! # Broker
//!
//! Registration contract and an in-process fan-out implementation.
//!
//! ```text
//!                      send_batch(events)
//!                             │
//!                 ┌───────────┴───────────┐
//!                 ▼                       ▼
//!          ack subscriber          loop subscriber
//!          push() inline     select { closed | skip | send | timeout }
//! ```
//!
//! Each subscriber only receives the events whose type it declared (or all
//! events if it declared `EventType::All`), in publish order. Loop
//! subscribers are served concurrently so a slow one only costs its own
//! timeout.

use crate::events::{Event, EventType};
use crate::subscriber::{EventBatch, Subscriber, SubscriberId};
use crate::DEFAULT_SEND_TIMEOUT;
use async_trait::async_trait;
use dn_telemetry::{BUS_EVENTS_PUBLISHED, BUS_EVENTS_SKIPPED, SUBSCRIBERS_ACTIVE, SUBSCRIBER_EVENTS};
use futures::future::join_all;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from broker registration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// No subscriber is registered under this id.
    #[error("Unknown subscriber: {0}")]
    UnknownSubscriber(SubscriberId),
}

/// Subscriber registration contract.
pub trait Broker: Send + Sync {
    /// Register a subscriber. Assigns and returns its id.
    fn subscribe(&self, sub: Arc<dyn Subscriber>) -> SubscriberId;

    /// Remove a subscriber from routing.
    fn unsubscribe(&self, id: SubscriberId) -> Result<(), BrokerError>;
}

/// Publishing side of the broker.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event.
    async fn send(&self, event: Event);

    /// Publish events in order.
    async fn send_batch(&self, events: Vec<Event>);

    /// Total events published.
    fn events_published(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Delivered,
    Skipped,
    TimedOut,
    Closed,
}

/// In-process broker.
pub struct InMemoryBroker {
    /// Registered subscribers by id.
    subscribers: RwLock<BTreeMap<SubscriberId, Arc<dyn Subscriber>>>,

    /// Next id to hand out. Ids start at 1.
    next_id: AtomicU64,

    /// Maximum wait for a loop subscriber's channel.
    send_timeout: Duration,

    /// Total events published.
    events_published: AtomicU64,
}

impl InMemoryBroker {
    /// Create a broker with the default send timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_send_timeout(DEFAULT_SEND_TIMEOUT)
    }

    /// Create a broker with a specific send timeout.
    #[must_use]
    pub fn with_send_timeout(send_timeout: Duration) -> Self {
        Self {
            subscribers: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            send_timeout,
            events_published: AtomicU64::new(0),
        }
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    #[must_use]
    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    fn routed(types: &[EventType], event: &Event) -> bool {
        types.contains(&EventType::All) || types.contains(&event.event_type())
    }

    async fn deliver(sub: Arc<dyn Subscriber>, batch: EventBatch, timeout: Duration) -> Delivery {
        let base = sub.base();
        if base.is_closed() {
            return Delivery::Closed;
        }
        let tx = base.c();
        tokio::select! {
            biased;
            () = base.closed() => Delivery::Closed,
            () = base.skip() => Delivery::Skipped,
            res = tx.send(batch) => match res {
                Ok(()) => Delivery::Delivered,
                Err(_) => Delivery::Closed,
            },
            () = tokio::time::sleep(timeout) => Delivery::TimedOut,
        }
    }

    fn remove(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.write().remove(&id).is_some();
        if removed {
            SUBSCRIBERS_ACTIVE.dec();
        }
        removed
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker for InMemoryBroker {
    fn subscribe(&self, sub: Arc<dyn Subscriber>) -> SubscriberId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        sub.set_id(id);

        info!(
            subscriber = sub.name(),
            id,
            ack = sub.ack(),
            types = ?sub.types(),
            "Subscriber registered"
        );

        self.subscribers.write().insert(id, sub);
        SUBSCRIBERS_ACTIVE.inc();
        id
    }

    fn unsubscribe(&self, id: SubscriberId) -> Result<(), BrokerError> {
        if self.remove(id) {
            debug!(id, "Subscriber unregistered");
            Ok(())
        } else {
            Err(BrokerError::UnknownSubscriber(id))
        }
    }
}

#[async_trait]
impl EventPublisher for InMemoryBroker {
    async fn send(&self, event: Event) {
        self.send_batch(vec![event]).await;
    }

    async fn send_batch(&self, events: Vec<Event>) {
        if events.is_empty() {
            return;
        }
        self.events_published
            .fetch_add(events.len() as u64, Ordering::Relaxed);
        for event in &events {
            BUS_EVENTS_PUBLISHED
                .with_label_values(&[event.event_type().as_str()])
                .inc();
        }

        // Snapshot so no lock is held across pushes or awaits.
        let subs: Vec<Arc<dyn Subscriber>> = self.subscribers.read().values().cloned().collect();

        let mut pending = Vec::new();
        for sub in subs {
            let types = sub.types();
            let batch: EventBatch = events
                .iter()
                .filter(|e| Self::routed(&types, e))
                .cloned()
                .collect();
            if batch.is_empty() {
                continue;
            }

            if sub.ack() {
                if sub.base().is_closed() {
                    sub.halt();
                    BUS_EVENTS_SKIPPED.with_label_values(&["closed"]).inc();
                    if self.remove(sub.id()) {
                        debug!(
                            subscriber = sub.name(),
                            id = sub.id(),
                            "Closed subscriber unregistered"
                        );
                    }
                    continue;
                }
                SUBSCRIBER_EVENTS
                    .with_label_values(&[sub.name()])
                    .inc_by(batch.len() as f64);
                sub.push(batch);
                continue;
            }

            let id = sub.id();
            let name = sub.name();
            pending.push(async move {
                (id, name, Self::deliver(sub, batch, self.send_timeout).await)
            });
        }

        for (id, name, outcome) in join_all(pending).await {
            match outcome {
                Delivery::Delivered => {}
                Delivery::Skipped => {
                    BUS_EVENTS_SKIPPED.with_label_values(&["paused"]).inc();
                    debug!(subscriber = name, id, "Subscriber paused, delivery skipped");
                }
                Delivery::TimedOut => {
                    BUS_EVENTS_SKIPPED.with_label_values(&["timeout"]).inc();
                    warn!(subscriber = name, id, "Subscriber channel full, delivery timed out");
                }
                Delivery::Closed => {
                    BUS_EVENTS_SKIPPED.with_label_values(&["closed"]).inc();
                    if self.remove(id) {
                        debug!(subscriber = name, id, "Closed subscriber unregistered");
                    }
                }
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
