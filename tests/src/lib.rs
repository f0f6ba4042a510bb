//! # Data Node Test Suite
//!
//! Cross-crate tests and benchmarks.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── broker_benchmarks.rs   # fan-out and parameter update throughput
//! └── src/integration/
//!     ├── flows.rs               # broker -> subscribers -> stores
//!     ├── observe.rs             # Service::observe_events streams
//!     └── netparams.rs           # store -> broker -> NetParamsSub, runtime
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dn-tests
//! cargo test -p dn-tests integration::observe::
//! cargo bench -p dn-tests
//! ```

#![allow(dead_code)]

pub mod integration;
