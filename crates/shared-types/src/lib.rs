//! # Shared Types Crate
//!
//! Domain entities carried by bus events and the error type shared by the
//! read-side stores.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every record a subscriber persists is
//!   defined here.
//! - **Plain Data**: Entities are serde-serializable values with no behaviour
//!   beyond small classification helpers.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
