//! # deposit-velocity
//!
//! Per-customer deposit velocity limits over calendar windows.
//!
//! Every customer gets an account the first time one of their deposits is
//! seen. Each deposit is checked against three ceilings before it is
//! committed:
//!
//! - **Weekly velocity**: sum of accepted deposits in the current ISO week
//! - **Daily velocity**: sum of accepted deposits in the current calendar day
//! - **Daily count**: number of accepted deposits in the current calendar day
//!
//! Windows are calendar-aligned, not sliding. Before the checks run, the
//! account's counters are zeroed if the deposit falls on a different day
//! (daily counters) or a different ISO week (all counters) than the last
//! accepted deposit. Rejected deposits leave the account untouched.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deposit_velocity::{DepositLimiter, DepositLimits, Transaction};
//! use chrono::DateTime;
//! use rust_decimal::Decimal;
//!
//! // Defaults: 5000 per day, 20000 per week, 3 deposits per day
//! let limiter = DepositLimiter::builder()
//!     .with_customer_limits("vip", DepositLimits::new(
//!         Decimal::from(50_000),
//!         Decimal::from(200_000),
//!         10,
//!     ).unwrap())
//!     .build()
//!     .unwrap();
//!
//! let deposit = Transaction::new(
//!     "15887",
//!     "528",
//!     Decimal::new(331_847, 2),
//!     DateTime::parse_from_rfc3339("2000-01-01T00:00:00Z").unwrap(),
//! );
//!
//! let outcome = limiter.process(&deposit);
//! println!("accepted: {}", outcome.accepted());
//! ```
//!
//! ## Ceiling Order
//!
//! Ceilings are checked weekly velocity, then daily velocity, then daily
//! count. A rejection reports the first ceiling that would be exceeded. A
//! deposit that lands exactly on a ceiling is accepted.
//!
//! ## Concurrency
//!
//! `DepositLimiter` is `Sync`. Deposits for the same customer are serialized
//! on that customer's account, so concurrent callers never both pass a check
//! that only one of them fits. For deterministic results on a whole feed,
//! use [`infrastructure::partition::process_partitioned`], which keeps each
//! customer's deposits in feed order while processing customers in parallel.
//!
//! ## Observability
//!
//! ```rust,no_run
//! # use deposit_velocity::DepositLimiter;
//! # let limiter = DepositLimiter::builder().build().unwrap();
//! let snapshot = limiter.metrics().snapshot();
//! println!("accepted: {}", snapshot.deposits_accepted);
//! println!("rejection rate: {:.2}%", snapshot.rejection_rate() * 100.0);
//! ```
//!
//! Decisions are also logged through `tracing`: rejections at `INFO`, window
//! resets and acceptances at `DEBUG`, dropped duplicate transactions at `WARN`.

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    account::{Account, DepositEvaluation, DepositLimits, LimitsError},
    outcome::{DepositOutcome, OutcomeRecord},
    policy::{DepositDecision, LimitViolation},
    transaction::{CustomerId, Transaction, TransactionId},
    window::WindowReset,
};

pub use application::{
    limiter::{BuildError, DepositLimiter, DepositLimiterBuilder},
    metrics::{Metrics, MetricsSnapshot},
    ports::AccountStore,
    registry::AccountRegistry,
};

pub use infrastructure::{
    config::{ConfigError, LimitsConfig, LimitsOverride},
    feed::{parse_amount, AmountError, FeedError, TransactionFeed},
    partition::{process_partitioned, CustomerPartitioner},
    storage::ShardedAccountStore,
    verifier::{ExpectedOutcomes, OutcomeVerifier, VerificationError, VerificationReport},
};
