//! Deposit limiter coordination logic.
//!
//! The limiter routes each transaction to its customer's account, rolls the
//! account's windows forward, checks the ceilings and commits accepted
//! deposits. All of that happens while the account is held exclusively, so
//! two deposits for the same customer never see overlapping snapshots.

use crate::application::metrics::Metrics;
use crate::application::ports::AccountStore;
use crate::application::registry::AccountRegistry;
use crate::domain::account::{Account, DepositEvaluation, DepositLimits, LimitsError};
use crate::domain::outcome::DepositOutcome;
use crate::domain::policy::{self, DepositDecision};
use crate::domain::transaction::{CustomerId, Transaction};
use crate::infrastructure::storage::ShardedAccountStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Error returned when building a `DepositLimiter` fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Default limits are invalid
    DefaultLimits(LimitsError),
    /// Limits configured for one customer are invalid
    CustomerLimits {
        /// Customer the limits were configured for
        customer_id: CustomerId,
        /// What is wrong with them
        error: LimitsError,
    },
    /// Per-customer limits were configured for an empty customer id
    EmptyCustomerId,
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::DefaultLimits(e) => write!(f, "invalid default limits: {}", e),
            BuildError::CustomerLimits { customer_id, error } => {
                write!(f, "invalid limits for customer {}: {}", customer_id, error)
            }
            BuildError::EmptyCustomerId => {
                write!(f, "customer limits configured for an empty customer id")
            }
        }
    }
}

impl std::error::Error for BuildError {}

impl From<LimitsError> for BuildError {
    fn from(e: LimitsError) -> Self {
        BuildError::DefaultLimits(e)
    }
}

/// Builder for constructing a `DepositLimiter`.
#[derive(Debug, Clone, Default)]
pub struct DepositLimiterBuilder {
    default_limits: DepositLimits,
    customer_limits: HashMap<CustomerId, DepositLimits>,
    expected_customers: Option<usize>,
}

impl DepositLimiterBuilder {
    /// Set the limits for every account without a customer-specific override.
    ///
    /// Default: 5000 daily, 20000 weekly, 3 deposits per day.
    pub fn with_default_limits(mut self, limits: DepositLimits) -> Self {
        self.default_limits = limits;
        self
    }

    /// Override the limits for one customer.
    ///
    /// Applied when the customer's account is opened; an account that is
    /// already open keeps the limits it was opened with.
    pub fn with_customer_limits(
        mut self,
        customer_id: impl Into<CustomerId>,
        limits: DepositLimits,
    ) -> Self {
        self.customer_limits.insert(customer_id.into(), limits);
        self
    }

    /// Pre-size the account store.
    pub fn with_expected_customers(mut self, count: usize) -> Self {
        self.expected_customers = Some(count);
        self
    }

    /// Build the limiter.
    ///
    /// # Errors
    /// Returns `BuildError` if the default or any customer limits are invalid.
    pub fn build(self) -> Result<DepositLimiter, BuildError> {
        self.default_limits.validate()?;

        for (customer_id, limits) in &self.customer_limits {
            if customer_id.is_empty() {
                return Err(BuildError::EmptyCustomerId);
            }
            limits.validate().map_err(|error| BuildError::CustomerLimits {
                customer_id: customer_id.clone(),
                error,
            })?;
        }

        let storage = match self.expected_customers {
            Some(count) => ShardedAccountStore::with_capacity(count),
            None => ShardedAccountStore::new(),
        };
        let registry = AccountRegistry::with_customer_limits(
            Arc::new(storage),
            self.default_limits,
            self.customer_limits,
        );

        Ok(DepositLimiter::new(registry, Metrics::new()))
    }
}

/// Coordinates deposit limit decisions across customers.
#[derive(Clone)]
pub struct DepositLimiter<S = Arc<ShardedAccountStore>>
where
    S: AccountStore + Clone,
{
    registry: AccountRegistry<S>,
    metrics: Metrics,
}

impl DepositLimiter {
    /// Create a builder for configuring the limiter.
    pub fn builder() -> DepositLimiterBuilder {
        DepositLimiterBuilder::default()
    }
}

impl<S> DepositLimiter<S>
where
    S: AccountStore + Clone,
{
    /// Create a limiter over an existing registry.
    pub fn new(registry: AccountRegistry<S>, metrics: Metrics) -> Self {
        Self { registry, metrics }
    }

    /// Process one deposit and decide whether to accept it.
    ///
    /// Opens the customer's account if this is its first deposit. Window
    /// reset, ceiling checks and commit run while the account is locked.
    /// Rejection is an ordinary outcome, never an error.
    pub fn process(&self, transaction: &Transaction) -> DepositOutcome {
        self.registry
            .with_account(&transaction.customer_id, |account, opened| {
                if opened {
                    self.metrics.record_account_opened();
                    debug!(
                        customer_id = %transaction.customer_id,
                        "Opened account"
                    );
                }

                let evaluation = account.deposit(transaction);
                self.record_evaluation(transaction, account, evaluation);

                DepositOutcome::new(transaction, evaluation, account.clone())
            })
    }

    /// Process deposits in arrival order.
    pub fn process_all<I>(&self, transactions: I) -> Vec<DepositOutcome>
    where
        I: IntoIterator<Item = Transaction>,
    {
        transactions
            .into_iter()
            .map(|transaction| self.process(&transaction))
            .collect()
    }

    fn record_evaluation(
        &self,
        transaction: &Transaction,
        account: &Account,
        evaluation: DepositEvaluation,
    ) {
        let DepositEvaluation { reset, decision } = evaluation;
        self.metrics.record_reset(reset);
        if reset.resets_daily() {
            debug!(
                customer_id = %transaction.customer_id,
                transaction_id = %transaction.id,
                window = %reset,
                "Calendar window rolled over, counters reset"
            );
        }

        match decision {
            DepositDecision::Accept => {
                self.metrics.record_accepted();
                debug!(
                    customer_id = %transaction.customer_id,
                    transaction_id = %transaction.id,
                    amount = %transaction.amount,
                    balance = %account.balance(),
                    "Deposit accepted"
                );
            }
            DepositDecision::Reject(violation) => {
                self.metrics.record_rejected(violation);
                let exceeded = policy::violations(account, transaction.amount);
                info!(
                    customer_id = %transaction.customer_id,
                    transaction_id = %transaction.id,
                    amount = %transaction.amount,
                    daily_velocity = %account.daily_deposit_velocity(),
                    weekly_velocity = %account.weekly_deposit_velocity(),
                    daily_count = account.daily_deposit_count(),
                    violation = %violation,
                    exceeded = ?exceeded,
                    "Deposit rejected, would exceed {}",
                    violation
                );
            }
        }
    }

    /// Get a copy of a customer's account, if it has been opened.
    pub fn account(&self, customer_id: &str) -> Option<Account> {
        self.registry.snapshot(customer_id)
    }

    /// Get the number of open accounts.
    pub fn account_count(&self) -> usize {
        self.registry.len()
    }

    /// Get a reference to the registry.
    pub fn registry(&self) -> &AccountRegistry<S> {
        &self.registry
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
