//! Deposit limit evaluation.
//!
//! Three ceilings are checked in a fixed order: weekly velocity, daily
//! velocity, daily count. The first ceiling a deposit would exceed decides
//! the rejection. Ceilings are inclusive, so a deposit that lands exactly on
//! a limit is accepted.

use crate::domain::account::Account;
use rust_decimal::Decimal;

/// A ceiling that a deposit would exceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitViolation {
    /// Weekly velocity plus the amount exceeds the weekly limit, or the
    /// amount no longer fits in the balance
    WeeklyVelocity,
    /// Daily velocity plus the amount exceeds the daily limit
    DailyVelocity,
    /// One more deposit exceeds the daily count limit
    DailyCount,
}

impl LimitViolation {
    /// All ceilings, in evaluation order.
    pub const ALL: [LimitViolation; 3] = [
        LimitViolation::WeeklyVelocity,
        LimitViolation::DailyVelocity,
        LimitViolation::DailyCount,
    ];

    /// Check whether depositing `amount` into `account` breaks this ceiling.
    ///
    /// Arithmetic overflow counts as exceeding the ceiling.
    pub fn is_exceeded(&self, account: &Account, amount: Decimal) -> bool {
        match self {
            LimitViolation::WeeklyVelocity => {
                account.balance.checked_add(amount).is_none()
                    || exceeds(
                        account.weekly_deposit_velocity.checked_add(amount),
                        account.limits.weekly_deposit_limit,
                    )
            }
            LimitViolation::DailyVelocity => exceeds(
                account.daily_deposit_velocity.checked_add(amount),
                account.limits.daily_deposit_limit,
            ),
            LimitViolation::DailyCount => match account.daily_deposit_count.checked_add(1) {
                Some(count) => count > account.limits.daily_deposit_count_limit,
                None => true,
            },
        }
    }
}

fn exceeds(total: Option<Decimal>, limit: Decimal) -> bool {
    total.map_or(true, |total| total > limit)
}

impl std::fmt::Display for LimitViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitViolation::WeeklyVelocity => write!(f, "weekly deposit limit"),
            LimitViolation::DailyVelocity => write!(f, "daily deposit limit"),
            LimitViolation::DailyCount => write!(f, "daily deposit count limit"),
        }
    }
}

/// Decision made for a single deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositDecision {
    /// Deposit is within every ceiling
    Accept,
    /// Deposit would exceed the given ceiling
    Reject(LimitViolation),
}

impl DepositDecision {
    /// Check if this decision is Accept.
    pub fn is_accept(&self) -> bool {
        matches!(self, DepositDecision::Accept)
    }

    /// Check if this decision is Reject.
    pub fn is_reject(&self) -> bool {
        matches!(self, DepositDecision::Reject(_))
    }

    /// The ceiling that caused a rejection.
    pub fn violation(&self) -> Option<LimitViolation> {
        match self {
            DepositDecision::Accept => None,
            DepositDecision::Reject(violation) => Some(*violation),
        }
    }
}

/// Decide whether `amount` may be deposited into `account` as it stands.
///
/// The account's windows must already be rolled forward to the deposit's
/// timestamp. This never mutates the account.
pub fn evaluate(account: &Account, amount: Decimal) -> DepositDecision {
    LimitViolation::ALL
        .into_iter()
        .find(|ceiling| ceiling.is_exceeded(account, amount))
        .map_or(DepositDecision::Accept, DepositDecision::Reject)
}

/// Every ceiling `amount` would exceed, in evaluation order.
///
/// Only the first entry decides the outcome; the rest are diagnostics.
pub fn violations(account: &Account, amount: Decimal) -> Vec<LimitViolation> {
    LimitViolation::ALL
        .into_iter()
        .filter(|ceiling| ceiling.is_exceeded(account, amount))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::DepositLimits;

    fn account(daily: i64, weekly: i64, count: u32) -> Account {
        let mut account = Account::open("1", DepositLimits::default());
        account.daily_deposit_velocity = Decimal::from(daily);
        account.weekly_deposit_velocity = Decimal::from(weekly);
        account.daily_deposit_count = count;
        account
    }

    #[test]
    fn test_accept_within_limits() {
        assert_eq!(
            evaluate(&account(0, 0, 0), Decimal::from(3000)),
            DepositDecision::Accept
        );
    }

    #[test]
    fn test_limits_are_inclusive() {
        assert_eq!(
            evaluate(&account(3000, 3000, 1), Decimal::from(2000)),
            DepositDecision::Accept
        );
        assert_eq!(
            evaluate(&account(0, 15000, 0), Decimal::from(5000)),
            DepositDecision::Accept
        );
        assert_eq!(
            evaluate(&account(0, 0, 2), Decimal::ONE),
            DepositDecision::Accept
        );
    }

    #[test]
    fn test_daily_velocity_rejection() {
        let decision = evaluate(&account(3000, 3000, 1), Decimal::from(3000));
        assert_eq!(
            decision,
            DepositDecision::Reject(LimitViolation::DailyVelocity)
        );
        assert!(decision.is_reject());
        assert_eq!(decision.violation(), Some(LimitViolation::DailyVelocity));
    }

    #[test]
    fn test_weekly_velocity_rejection() {
        assert_eq!(
            evaluate(&account(0, 19000, 0), Decimal::new(100_001, 2)),
            DepositDecision::Reject(LimitViolation::WeeklyVelocity)
        );
    }

    #[test]
    fn test_count_rejection() {
        assert_eq!(
            evaluate(&account(500, 500, 3), Decimal::from(100)),
            DepositDecision::Reject(LimitViolation::DailyCount)
        );
    }

    #[test]
    fn test_weekly_checked_before_daily_and_count() {
        let full = account(5000, 20000, 3);

        assert_eq!(
            evaluate(&full, Decimal::ONE),
            DepositDecision::Reject(LimitViolation::WeeklyVelocity)
        );
        assert_eq!(violations(&full, Decimal::ONE), LimitViolation::ALL.to_vec());
    }

    #[test]
    fn test_daily_checked_before_count() {
        assert_eq!(
            evaluate(&account(5000, 5000, 3), Decimal::ONE),
            DepositDecision::Reject(LimitViolation::DailyVelocity)
        );
    }

    #[test]
    fn test_overflow_is_rejected() {
        let funded = account(0, 1, 0);
        assert_eq!(
            evaluate(&funded, Decimal::MAX),
            DepositDecision::Reject(LimitViolation::WeeklyVelocity)
        );

        let mut counted = account(0, 0, 0);
        counted.limits.daily_deposit_count_limit = u32::MAX;
        counted.daily_deposit_count = u32::MAX;
        assert!(LimitViolation::DailyCount.is_exceeded(&counted, Decimal::ONE));
    }

    #[test]
    fn test_balance_overflow_is_rejected() {
        let mut rich = account(0, 0, 0);
        rich.limits.daily_deposit_limit = Decimal::MAX;
        rich.limits.weekly_deposit_limit = Decimal::MAX;
        rich.balance = Decimal::MAX - Decimal::ONE;

        assert_eq!(
            evaluate(&rich, Decimal::from(2)),
            DepositDecision::Reject(LimitViolation::WeeklyVelocity)
        );
        assert_eq!(evaluate(&rich, Decimal::ONE), DepositDecision::Accept);
    }

    #[test]
    fn test_evaluate_is_pure() {
        let account = account(4000, 4000, 2);
        let before = account.clone();

        let first = evaluate(&account, Decimal::from(2000));
        let second = evaluate(&account, Decimal::from(2000));

        assert_eq!(first, second);
        assert_eq!(account, before);
    }

    #[test]
    fn test_no_violations_when_accepted() {
        assert!(violations(&account(0, 0, 0), Decimal::from(10)).is_empty());
    }
}
