//! # dn-subscribers
//!
//! Read-side subscribers of the data node event broker.
//!
//! ## Overview
//!
//! This crate provides:
//! - **Typed subscribers**: one per domain concern, buffering events and
//!   flushing them to a store on every time update, or persisting per event
//! - **Query subscribers**: in-memory views (governance, market depth, node
//!   view, network parameters, block time)
//! - **Stream subscriber**: filterable event buffer with a single reader
//! - **Observe service**: live event streams with retry-budget backpressure
//!
//! ## Architecture
//!
//! ```text
//!                       ┌─────────────┐
//!   core node ─events─► │   Broker    │
//!                       └──────┬──────┘
//!            ┌─────────────────┼──────────────────┐
//!            ▼                 ▼                  ▼
//!     typed subscriber   query subscriber     StreamSub
//!            │                 │                  │
//!     outbound store      read APIs        Service::observe_events
//! ```
//!
//! ## Failure Policy
//!
//! | Failure | Handling |
//! |---------|----------|
//! | store write fails | logged at error level, counted, dropped |
//! | unexpected event type | panic: broker routing is broken |
//! | slow stream reader | batch dropped, retry budget spent |
//!
//! ## Example
//!
//! ```rust,ignore
//! use dn_subscribers::{OrderSub, SubscriberConfig};
//! use dn_subscribers::adapters::RecordingStore;
//!
//! let store = Arc::new(RecordingStore::new());
//! let orders = OrderSub::new(&ctx, store, SubscriberConfig::default());
//! broker.subscribe(orders);
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod config;
pub mod error;
pub mod ports;
pub mod service;
pub mod stream;
pub mod subscribers;

pub use config::{SubscriberConfig, MAX_BUFFER_SIZE, MIN_BUFFER_SIZE};
pub use error::{SubscriberError, SubscriberResult};
pub use ports::inbound::{EventObserver, NodeQuery};
pub use service::Service;
pub use stream::{market_filter, party_filter, EventFilter, StreamSub};
pub use subscribers::*;
