//! Account store.
//!
//! The registry owns every customer's account. Accounts are opened lazily on
//! first sight of a customer id and are never removed by the limiter.

use crate::application::ports::AccountStore;
use crate::domain::account::{Account, DepositLimits};
use crate::domain::transaction::CustomerId;
use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry managing all customer accounts.
///
/// Each account is locked exclusively while a callback runs against it.
/// Generic over the store so tests and embedders can supply their own; the
/// limiter uses `Arc<ShardedAccountStore>`.
#[derive(Clone)]
pub struct AccountRegistry<S>
where
    S: AccountStore + Clone,
{
    store: S,
    default_limits: DepositLimits,
    customer_limits: Arc<HashMap<CustomerId, DepositLimits>>,
}

impl<S> AccountRegistry<S>
where
    S: AccountStore + Clone,
{
    /// Create a registry where every new account gets `default_limits`.
    pub fn new(store: S, default_limits: DepositLimits) -> Self {
        Self::with_customer_limits(store, default_limits, HashMap::new())
    }

    /// Create a registry with per-customer limits applied at account opening.
    pub fn with_customer_limits(
        store: S,
        default_limits: DepositLimits,
        customer_limits: HashMap<CustomerId, DepositLimits>,
    ) -> Self {
        Self {
            store,
            default_limits,
            customer_limits: Arc::new(customer_limits),
        }
    }

    /// Access or open the account for a customer with a callback.
    ///
    /// The callback receives the account and whether it was opened by this
    /// call. No other caller can touch the same account until it returns.
    pub fn with_account<F, R>(&self, customer_id: &str, f: F) -> R
    where
        F: FnOnce(&mut Account, bool) -> R,
    {
        let opened = Cell::new(false);
        let limits = self.limits_for(customer_id);
        self.store.with_account_mut(
            customer_id,
            || {
                opened.set(true);
                Account::open(customer_id, limits)
            },
            |account| f(account, opened.get()),
        )
    }

    /// Limits a newly opened account for `customer_id` would get.
    pub fn limits_for(&self, customer_id: &str) -> DepositLimits {
        self.customer_limits
            .get(customer_id)
            .copied()
            .unwrap_or(self.default_limits)
    }

    /// Get a copy of a customer's account, if it has been opened.
    pub fn snapshot(&self, customer_id: &str) -> Option<Account> {
        self.store.with_account(customer_id, Account::clone)
    }

    /// Get the default limits.
    pub fn default_limits(&self) -> &DepositLimits {
        &self.default_limits
    }

    /// Get the number of open accounts.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if no account has been opened yet.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Drop all accounts.
    pub fn clear(&self) {
        self.store.clear();
    }

    /// Iterate over all accounts with a callback.
    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&Account),
    {
        self.store.for_each(f);
    }
}
