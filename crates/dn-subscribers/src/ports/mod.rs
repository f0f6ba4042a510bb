//! Ports layer for the subscriber crate.
//!
//! - Inbound (Driving) ports: read APIs exposed to query layers
//! - Outbound (Driven) ports: the read-side stores subscribers write to

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
