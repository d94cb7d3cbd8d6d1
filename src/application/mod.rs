//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and manages runtime behavior:
//! - Account store (lazy opening, per-customer limits)
//! - Deposit limiter (reset, evaluate, commit under one lock)
//! - Metrics
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod limiter;
pub mod metrics;
pub mod ports;
pub mod registry;
