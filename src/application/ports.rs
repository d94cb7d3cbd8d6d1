//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use crate::domain::account::Account;
use std::fmt::Debug;
use std::sync::Arc;

/// Port for the concurrent account store.
///
/// `with_account_mut` holds the account exclusively until the callback
/// returns; accounts of other customers stay available to other threads.
/// Accounts are looked up by borrowed customer id, so a lookup of an
/// existing account does not allocate.
pub trait AccountStore: Send + Sync + Debug {
    /// Run `f` against the customer's account, opening it with `open` first
    /// if the customer has none.
    ///
    /// `open` is called at most once, and only if no other caller opened the
    /// account in the meantime.
    fn with_account_mut<R>(
        &self,
        customer_id: &str,
        open: impl FnOnce() -> Account,
        f: impl FnOnce(&mut Account) -> R,
    ) -> R;

    /// Run `f` against the customer's account if it exists.
    fn with_account<R>(&self, customer_id: &str, f: impl FnOnce(&Account) -> R) -> Option<R>;

    /// Number of open accounts.
    fn len(&self) -> usize;

    /// Check if no account is open.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every account.
    fn clear(&self);

    /// Visit every account. Order is unspecified.
    fn for_each(&self, f: impl FnMut(&Account));
}

impl<T: AccountStore + ?Sized> AccountStore for Arc<T> {
    fn with_account_mut<R>(
        &self,
        customer_id: &str,
        open: impl FnOnce() -> Account,
        f: impl FnOnce(&mut Account) -> R,
    ) -> R {
        (**self).with_account_mut(customer_id, open, f)
    }

    fn with_account<R>(&self, customer_id: &str, f: impl FnOnce(&Account) -> R) -> Option<R> {
        (**self).with_account(customer_id, f)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn for_each(&self, f: impl FnMut(&Account)) {
        (**self).for_each(f)
    }
}
