//! # dn-netparams
//!
//! Typed, validated network parameters.
//!
//! ## Overview
//!
//! Every parameter has a fixed key, a kind (float, int, uint, duration, JSON
//! or string), a list of rules and a mutability flag. Values are always
//! written as text and read back verbatim; typed getters return the parsed
//! form.
//!
//! | Operation | Lock | Effect |
//! |-----------|------|--------|
//! | `validate` | read | none |
//! | `update` | write | commit, mark dirty, publish event |
//! | `upload_defaults_from_genesis` | write | all-or-nothing overwrite |
//! | `load_checkpoint` | write | restore without rules |
//! | `dispatch_changes` | write, then watchers | notify watchers of dirty keys |
//!
//! ## Example
//!
//! ```rust,ignore
//! use dn_netparams::{keys, Store};
//!
//! let store = Store::new()?.with_publisher(broker.clone());
//! store.update(keys::GOVERNANCE_PROPOSAL_MARKET_MIN_CLOSE, "10h").await?;
//! assert_eq!(store.get(keys::GOVERNANCE_PROPOSAL_MARKET_MIN_CLOSE)?, "10h");
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod defaults;
pub mod duration;
pub mod error;
pub mod keys;
pub mod schemas;
pub mod store;
pub mod values;

pub use defaults::{default_values, Dependency, DEPENDENCIES};
pub use duration::{format_duration, parse_duration, DurationError};
pub use error::{NetParamsError, NetParamsResult};
pub use store::{Store, Watcher};
pub use values::{Parsed, Relation, Rule, Value};
