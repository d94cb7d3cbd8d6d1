//! In-memory account store.

use crate::application::ports::AccountStore;
use crate::domain::account::Account;
use crate::domain::transaction::CustomerId;
use dashmap::DashMap;

/// Account store sharded over a `DashMap`.
///
/// An account is guarded by its shard's lock while a callback runs against
/// it, which makes the reset-evaluate-commit sequence for one deposit a
/// single critical section.
#[derive(Debug, Default)]
pub struct ShardedAccountStore {
    accounts: DashMap<CustomerId, Account>,
}

impl ShardedAccountStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-sized for `customers` accounts.
    pub fn with_capacity(customers: usize) -> Self {
        Self {
            accounts: DashMap::with_capacity(customers),
        }
    }
}

impl AccountStore for ShardedAccountStore {
    fn with_account_mut<R>(
        &self,
        customer_id: &str,
        open: impl FnOnce() -> Account,
        f: impl FnOnce(&mut Account) -> R,
    ) -> R {
        if let Some(mut account) = self.accounts.get_mut(customer_id) {
            return f(account.value_mut());
        }
        // Another caller may open the account between the two lookups;
        // `or_insert_with` then keeps theirs and skips `open`.
        let mut account = self
            .accounts
            .entry(customer_id.to_owned())
            .or_insert_with(open);
        f(account.value_mut())
    }

    fn with_account<R>(&self, customer_id: &str, f: impl FnOnce(&Account) -> R) -> Option<R> {
        self.accounts
            .get(customer_id)
            .map(|account| f(account.value()))
    }

    fn len(&self) -> usize {
        self.accounts.len()
    }

    fn clear(&self) {
        self.accounts.clear();
    }

    fn for_each(&self, mut f: impl FnMut(&Account)) {
        self.accounts.iter().for_each(|entry| f(entry.value()));
    }
}
