//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - In-memory account store (sharded map)
//! - JSON-lines transaction feeds and expected-outcome verification
//! - Limits configuration files
//! - Customer-partitioned parallel processing

pub mod config;
pub mod feed;
pub mod partition;
pub mod storage;
pub mod verifier;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds. It provides a tracing layer that captures events so
/// tests can assert on what the limiter logged.
///
/// To use these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// deposit-velocity = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
