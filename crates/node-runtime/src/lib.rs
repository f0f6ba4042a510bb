//! # Node Runtime Library
//!
//! Wiring of the data node: configuration and the runtime that owns the
//! broker, the network parameters store and every subscriber. The binary in
//! `main.rs` only adds telemetry and signal handling.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod runtime;

pub use config::{ConfigError, NodeConfig};
pub use runtime::{MemoryStores, NodeRuntime};
