//! Per-customer account state and deposit limit configuration.
//!
//! An account holds the running balance together with the rolling counters
//! that deposit limits are checked against. Counters only move in two ways:
//! a window rollover zeroes them, and an accepted deposit advances them.

use crate::domain::policy::{self, DepositDecision};
use crate::domain::transaction::{CustomerId, Transaction};
use crate::domain::window::WindowReset;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default ceiling on the sum of accepted deposits in one calendar day.
pub const DEFAULT_DAILY_DEPOSIT_LIMIT: Decimal = Decimal::from_parts(5_000, 0, 0, false, 0);

/// Default ceiling on the sum of accepted deposits in one ISO week.
pub const DEFAULT_WEEKLY_DEPOSIT_LIMIT: Decimal = Decimal::from_parts(20_000, 0, 0, false, 0);

/// Default ceiling on the number of accepted deposits in one calendar day.
pub const DEFAULT_DAILY_DEPOSIT_COUNT_LIMIT: u32 = 3;

/// Error returned when a deposit limit configuration is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitsError {
    /// Daily deposit limit must be greater than zero
    NonPositiveDailyLimit(Decimal),
    /// Weekly deposit limit must be greater than zero
    NonPositiveWeeklyLimit(Decimal),
    /// Daily deposit count limit must be greater than zero
    ZeroDailyCountLimit,
}

impl std::fmt::Display for LimitsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitsError::NonPositiveDailyLimit(limit) => {
                write!(f, "daily deposit limit must be greater than 0, got {}", limit)
            }
            LimitsError::NonPositiveWeeklyLimit(limit) => {
                write!(f, "weekly deposit limit must be greater than 0, got {}", limit)
            }
            LimitsError::ZeroDailyCountLimit => {
                write!(f, "daily deposit count limit must be greater than 0")
            }
        }
    }
}

impl std::error::Error for LimitsError {}

/// Ceilings applied to a single account.
///
/// Deserializes with every field optional; missing fields fall back to the
/// defaults (5000 daily, 20000 weekly, 3 deposits per day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepositLimits {
    /// Maximum sum of accepted deposits per calendar day
    pub daily_deposit_limit: Decimal,
    /// Maximum sum of accepted deposits per ISO week
    pub weekly_deposit_limit: Decimal,
    /// Maximum number of accepted deposits per calendar day
    pub daily_deposit_count_limit: u32,
}

impl DepositLimits {
    /// Create a validated set of limits.
    ///
    /// # Errors
    /// Returns `LimitsError` if any ceiling is zero or negative.
    pub fn new(
        daily_deposit_limit: Decimal,
        weekly_deposit_limit: Decimal,
        daily_deposit_count_limit: u32,
    ) -> Result<Self, LimitsError> {
        let limits = Self {
            daily_deposit_limit,
            weekly_deposit_limit,
            daily_deposit_count_limit,
        };
        limits.validate()?;
        Ok(limits)
    }

    /// Check that every ceiling is positive.
    pub fn validate(&self) -> Result<(), LimitsError> {
        if self.daily_deposit_limit <= Decimal::ZERO {
            return Err(LimitsError::NonPositiveDailyLimit(self.daily_deposit_limit));
        }
        if self.weekly_deposit_limit <= Decimal::ZERO {
            return Err(LimitsError::NonPositiveWeeklyLimit(
                self.weekly_deposit_limit,
            ));
        }
        if self.daily_deposit_count_limit == 0 {
            return Err(LimitsError::ZeroDailyCountLimit);
        }
        Ok(())
    }
}

impl Default for DepositLimits {
    fn default() -> Self {
        Self {
            daily_deposit_limit: DEFAULT_DAILY_DEPOSIT_LIMIT,
            weekly_deposit_limit: DEFAULT_WEEKLY_DEPOSIT_LIMIT,
            daily_deposit_count_limit: DEFAULT_DAILY_DEPOSIT_COUNT_LIMIT,
        }
    }
}

/// Result of running one transaction through an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositEvaluation {
    /// Which counters were zeroed before the limits were checked
    pub reset: WindowReset,
    /// Accept or reject, with the first violated ceiling on rejection
    pub decision: DepositDecision,
}

/// Deposit state for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub(crate) customer_id: CustomerId,
    pub(crate) balance: Decimal,
    pub(crate) limits: DepositLimits,
    pub(crate) daily_deposit_velocity: Decimal,
    pub(crate) weekly_deposit_velocity: Decimal,
    pub(crate) daily_deposit_count: u32,
    pub(crate) last_accepted_deposit: Option<Transaction>,
}

impl Account {
    /// Open an account with zeroed counters and no deposit history.
    pub fn open(customer_id: impl Into<CustomerId>, limits: DepositLimits) -> Self {
        Self {
            customer_id: customer_id.into(),
            balance: Decimal::ZERO,
            limits,
            daily_deposit_velocity: Decimal::ZERO,
            weekly_deposit_velocity: Decimal::ZERO,
            daily_deposit_count: 0,
            last_accepted_deposit: None,
        }
    }

    /// Roll the windows forward to the transaction's calendar position, then
    /// accept or reject it, committing its effects only on acceptance.
    ///
    /// The window reset sticks even when the deposit is rejected: it reflects
    /// calendar time passing, not the deposit itself.
    pub fn deposit(&mut self, transaction: &Transaction) -> DepositEvaluation {
        let reset = WindowReset::between(
            self.last_accepted_deposit.as_ref().map(|last| &last.timestamp),
            &transaction.timestamp,
        );
        reset.apply(self);

        let decision = policy::evaluate(self, transaction.amount);
        if decision.is_accept() {
            self.commit(transaction);
        }

        DepositEvaluation { reset, decision }
    }

    /// Apply an accepted deposit to the balance and the rolling counters.
    ///
    /// Sums saturate; `evaluate` has already rejected any deposit that
    /// would overflow them.
    pub(crate) fn commit(&mut self, transaction: &Transaction) {
        let amount = transaction.amount;
        self.weekly_deposit_velocity = self.weekly_deposit_velocity.saturating_add(amount);
        self.daily_deposit_velocity = self.daily_deposit_velocity.saturating_add(amount);
        self.daily_deposit_count = self.daily_deposit_count.saturating_add(1);
        self.balance = self.balance.saturating_add(amount);
        self.last_accepted_deposit = Some(transaction.clone());
    }

    /// Customer this account belongs to.
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    /// Sum of all accepted deposits.
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Ceilings applied to this account.
    pub fn limits(&self) -> &DepositLimits {
        &self.limits
    }

    /// Sum of accepted deposits in the current calendar day.
    pub fn daily_deposit_velocity(&self) -> Decimal {
        self.daily_deposit_velocity
    }

    /// Sum of accepted deposits in the current ISO week.
    pub fn weekly_deposit_velocity(&self) -> Decimal {
        self.weekly_deposit_velocity
    }

    /// Number of accepted deposits in the current calendar day.
    pub fn daily_deposit_count(&self) -> u32 {
        self.daily_deposit_count
    }

    /// Most recently accepted deposit, if any.
    pub fn last_accepted_deposit(&self) -> Option<&Transaction> {
        self.last_accepted_deposit.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::policy::LimitViolation;
    use chrono::DateTime;

    fn deposit(id: &str, amount: i64, at: &str) -> Transaction {
        Transaction::new(
            id,
            "42",
            Decimal::from(amount),
            DateTime::parse_from_rfc3339(at).unwrap(),
        )
    }

    #[test]
    fn test_default_limits() {
        let limits = DepositLimits::default();

        assert_eq!(limits.daily_deposit_limit, Decimal::from(5000));
        assert_eq!(limits.weekly_deposit_limit, Decimal::from(20000));
        assert_eq!(limits.daily_deposit_count_limit, 3);
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn test_limits_validation() {
        assert_eq!(
            DepositLimits::new(Decimal::ZERO, Decimal::from(10), 1),
            Err(LimitsError::NonPositiveDailyLimit(Decimal::ZERO))
        );
        assert_eq!(
            DepositLimits::new(Decimal::from(10), Decimal::from(-1), 1),
            Err(LimitsError::NonPositiveWeeklyLimit(Decimal::from(-1)))
        );
        assert_eq!(
            DepositLimits::new(Decimal::from(10), Decimal::from(10), 0),
            Err(LimitsError::ZeroDailyCountLimit)
        );
        assert!(DepositLimits::new(Decimal::from(10), Decimal::from(5), 1).is_ok());
    }

    #[test]
    fn test_limits_deserialize_with_partial_fields() {
        let limits: DepositLimits =
            serde_json::from_str(r#"{"daily_deposit_limit": "1000"}"#).unwrap();

        assert_eq!(limits.daily_deposit_limit, Decimal::from(1000));
        assert_eq!(limits.weekly_deposit_limit, DEFAULT_WEEKLY_DEPOSIT_LIMIT);
        assert_eq!(limits.daily_deposit_count_limit, 3);
    }

    #[test]
    fn test_open_account_is_zeroed() {
        let account = Account::open("42", DepositLimits::default());

        assert_eq!(account.customer_id(), "42");
        assert_eq!(account.balance(), Decimal::ZERO);
        assert_eq!(account.daily_deposit_velocity(), Decimal::ZERO);
        assert_eq!(account.weekly_deposit_velocity(), Decimal::ZERO);
        assert_eq!(account.daily_deposit_count(), 0);
        assert!(account.last_accepted_deposit().is_none());
    }

    #[test]
    fn test_accepted_deposit_advances_counters() {
        let mut account = Account::open("42", DepositLimits::default());
        let tx = deposit("1", 3000, "2024-01-01T10:00:00Z");

        let evaluation = account.deposit(&tx);

        assert_eq!(evaluation.reset, WindowReset::None);
        assert_eq!(evaluation.decision, DepositDecision::Accept);
        assert_eq!(account.balance(), Decimal::from(3000));
        assert_eq!(account.daily_deposit_velocity(), Decimal::from(3000));
        assert_eq!(account.weekly_deposit_velocity(), Decimal::from(3000));
        assert_eq!(account.daily_deposit_count(), 1);
        assert_eq!(account.last_accepted_deposit(), Some(&tx));
    }

    #[test]
    fn test_rejected_deposit_leaves_account_untouched() {
        let mut account = Account::open("42", DepositLimits::default());
        account.deposit(&deposit("1", 3000, "2024-01-01T10:00:00Z"));
        let before = account.clone();

        let evaluation = account.deposit(&deposit("2", 3000, "2024-01-01T11:00:00Z"));

        assert_eq!(
            evaluation.decision,
            DepositDecision::Reject(LimitViolation::DailyVelocity)
        );
        assert_eq!(account, before);
    }

    #[test]
    fn test_reset_sticks_on_rejected_deposit() {
        let mut account = Account::open("42", DepositLimits::default());
        account.deposit(&deposit("1", 4000, "2024-01-01T10:00:00Z"));

        // Next day, but too large for a single day
        let evaluation = account.deposit(&deposit("2", 6000, "2024-01-02T10:00:00Z"));

        assert_eq!(evaluation.reset, WindowReset::Daily);
        assert!(evaluation.decision.is_reject());
        assert_eq!(account.daily_deposit_velocity(), Decimal::ZERO);
        assert_eq!(account.daily_deposit_count(), 0);
        assert_eq!(account.weekly_deposit_velocity(), Decimal::from(4000));
        assert_eq!(account.balance(), Decimal::from(4000));
        assert_eq!(
            account.last_accepted_deposit().map(|tx| tx.id.as_str()),
            Some("1")
        );
    }

    #[test]
    fn test_balance_overflow_after_weekly_reset_is_rejected() {
        let huge = Decimal::from_i128_with_scale(50_000_000_000_000_000_000_000_000_000, 0);
        let limits = DepositLimits::new(huge, huge, 3).unwrap();
        let mut account = Account::open("42", limits);
        let first = Transaction::new(
            "1",
            "42",
            huge,
            DateTime::parse_from_rfc3339("2024-01-01T10:00:00Z").unwrap(),
        );
        let next_week = Transaction::new(
            "2",
            "42",
            huge,
            DateTime::parse_from_rfc3339("2024-01-08T10:00:00Z").unwrap(),
        );

        assert!(account.deposit(&first).decision.is_accept());
        let evaluation = account.deposit(&next_week);

        assert_eq!(evaluation.reset, WindowReset::Weekly);
        assert_eq!(
            evaluation.decision,
            DepositDecision::Reject(LimitViolation::WeeklyVelocity)
        );
        assert_eq!(account.balance(), huge);
        assert_eq!(account.weekly_deposit_velocity(), Decimal::ZERO);
    }

    #[test]
    fn test_reevaluating_rejected_deposit_is_stable() {
        let mut account = Account::open("42", DepositLimits::default());
        account.deposit(&deposit("1", 5000, "2024-01-01T10:00:00Z"));
        let tx = deposit("2", 1, "2024-01-01T11:00:00Z");

        let first = account.deposit(&tx);
        let snapshot = account.clone();
        let second = account.deposit(&tx);

        assert_eq!(first, second);
        assert_eq!(account, snapshot);
    }
}
