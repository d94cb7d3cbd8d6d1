//! Domain layer - pure deposit limit logic with no I/O.
//!
//! This layer contains the core concepts and invariants of the limiter:
//! - Account state and limit configuration
//! - Calendar window rollover
//! - Ceiling checks
//! - Per-transaction outcomes
//!
//! All types in this layer are pure and easily testable.

pub mod account;
pub mod outcome;
pub mod policy;
pub mod transaction;
pub mod window;
