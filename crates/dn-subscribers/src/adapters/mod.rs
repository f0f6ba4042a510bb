//! Adapters layer.
//!
//! In-memory implementations of the outbound store ports, used by the node
//! runtime when no database is attached and by tests to record writes.

pub mod memory;

pub use memory::{MemoryNodeStore, RecordingStore};
