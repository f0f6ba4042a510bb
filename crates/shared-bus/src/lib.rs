//! # Shared Bus - Event Fan-Out for the Data Node
//!
//! Distributes domain events from the core node to many independent
//! subscribers that buffer, filter and persist them.
//!
//! ## Fan-Out
//!
//! ```text
//!   core node ──► Broker ──┬──► [orders]   ──► OrderStore
//!                          ├──► [trades]   ──► TradeStore
//!                          ├──► [accounts] ──► AccountStore
//!                          └──► [stream]   ──► observe_events()
//! ```
//!
//! ## Rules
//!
//! - Each subscriber declares its event types once; the broker routes by them.
//! - Each subscriber processes its own events in delivery order; there is no
//!   ordering across subscribers.
//! - Cancelling the parent token halts every subscriber derived from it.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod broker;
pub mod events;
pub mod subscriber;

// Re-export main types
pub use broker::{Broker, BrokerError, EventPublisher, InMemoryBroker};
pub use events::{Event, EventPayload, EventType};
pub use subscriber::{spawn_loop, Base, EventBatch, Subscriber, SubscriberId};
pub use tokio_util::sync::CancellationToken;

use std::time::Duration;

/// Default channel buffer for a subscriber.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10;

/// How long the broker waits on a full subscriber channel before dropping.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(1);
