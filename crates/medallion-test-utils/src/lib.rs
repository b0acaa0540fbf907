//! Shared test utilities for medallion integration tests.
//!
//! This crate provides:
//! - [`FakeWarehouse`]: an HTTP SQL statement endpoint backed by an in-memory platform
//! - Fixture helpers for the default `fmcg` layout
//! - Assertion helpers over namespace listings
//!
//! # Example
//!
//! ```rust,ignore
//! use medallion_test_utils::{FakeWarehouse, default_layout};
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let warehouse = FakeWarehouse::start(InMemoryPlatform::new()).await.unwrap();
//!     // ... point a client at warehouse.base_url() ...
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod assertions;
pub mod fixtures;
pub mod warehouse;

pub use assertions::*;
pub use fixtures::*;
pub use warehouse::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("medallion=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
