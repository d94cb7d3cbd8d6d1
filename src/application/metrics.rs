//! Observability metrics for deposit limiting.
//!
//! Provides counters about limiter behavior for monitoring and debugging.

use crate::domain::policy::LimitViolation;
use crate::domain::window::WindowReset;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking deposit limiting statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Total number of deposits accepted
    deposits_accepted: AtomicU64,
    /// Rejections by the weekly velocity ceiling
    weekly_limit_rejections: AtomicU64,
    /// Rejections by the daily velocity ceiling
    daily_limit_rejections: AtomicU64,
    /// Rejections by the daily count ceiling
    daily_count_rejections: AtomicU64,
    /// Daily-only window resets
    daily_resets: AtomicU64,
    /// Weekly (and daily) window resets
    weekly_resets: AtomicU64,
    /// Accounts opened on first sight of a customer
    accounts_opened: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    /// Record an accepted deposit.
    pub(crate) fn record_accepted(&self) {
        self.inner.deposits_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected deposit under the ceiling that rejected it.
    pub(crate) fn record_rejected(&self, violation: LimitViolation) {
        let counter = match violation {
            LimitViolation::WeeklyVelocity => &self.inner.weekly_limit_rejections,
            LimitViolation::DailyVelocity => &self.inner.daily_limit_rejections,
            LimitViolation::DailyCount => &self.inner.daily_count_rejections,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a window reset.
    pub(crate) fn record_reset(&self, reset: WindowReset) {
        match reset {
            WindowReset::None => {}
            WindowReset::Daily => {
                self.inner.daily_resets.fetch_add(1, Ordering::Relaxed);
            }
            WindowReset::Weekly => {
                self.inner.weekly_resets.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Record a newly opened account.
    pub(crate) fn record_account_opened(&self) {
        self.inner.accounts_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the total number of deposits accepted.
    pub fn deposits_accepted(&self) -> u64 {
        self.inner.deposits_accepted.load(Ordering::Relaxed)
    }

    /// Get the total number of deposits rejected, across all ceilings.
    pub fn deposits_rejected(&self) -> u64 {
        self.rejections(LimitViolation::WeeklyVelocity)
            .saturating_add(self.rejections(LimitViolation::DailyVelocity))
            .saturating_add(self.rejections(LimitViolation::DailyCount))
    }

    /// Get the number of rejections caused by one ceiling.
    pub fn rejections(&self, violation: LimitViolation) -> u64 {
        match violation {
            LimitViolation::WeeklyVelocity => &self.inner.weekly_limit_rejections,
            LimitViolation::DailyVelocity => &self.inner.daily_limit_rejections,
            LimitViolation::DailyCount => &self.inner.daily_count_rejections,
        }
        .load(Ordering::Relaxed)
    }

    /// Get the number of daily-only window resets.
    pub fn daily_resets(&self) -> u64 {
        self.inner.daily_resets.load(Ordering::Relaxed)
    }

    /// Get the number of weekly window resets.
    pub fn weekly_resets(&self) -> u64 {
        self.inner.weekly_resets.load(Ordering::Relaxed)
    }

    /// Get the number of accounts opened.
    pub fn accounts_opened(&self) -> u64 {
        self.inner.accounts_opened.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            deposits_accepted: self.deposits_accepted(),
            weekly_limit_rejections: self.rejections(LimitViolation::WeeklyVelocity),
            daily_limit_rejections: self.rejections(LimitViolation::DailyVelocity),
            daily_count_rejections: self.rejections(LimitViolation::DailyCount),
            daily_resets: self.daily_resets(),
            weekly_resets: self.weekly_resets(),
            accounts_opened: self.accounts_opened(),
        }
    }

    /// Reset all metrics to zero.
    ///
    /// Useful for testing or when starting a new monitoring period.
    pub fn reset(&self) {
        self.inner.deposits_accepted.store(0, Ordering::Relaxed);
        self.inner.weekly_limit_rejections.store(0, Ordering::Relaxed);
        self.inner.daily_limit_rejections.store(0, Ordering::Relaxed);
        self.inner.daily_count_rejections.store(0, Ordering::Relaxed);
        self.inner.daily_resets.store(0, Ordering::Relaxed);
        self.inner.weekly_resets.store(0, Ordering::Relaxed);
        self.inner.accounts_opened.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Total number of deposits accepted
    pub deposits_accepted: u64,
    /// Rejections by the weekly velocity ceiling
    pub weekly_limit_rejections: u64,
    /// Rejections by the daily velocity ceiling
    pub daily_limit_rejections: u64,
    /// Rejections by the daily count ceiling
    pub daily_count_rejections: u64,
    /// Daily-only window resets
    pub daily_resets: u64,
    /// Weekly window resets
    pub weekly_resets: u64,
    /// Accounts opened
    pub accounts_opened: u64,
}

impl MetricsSnapshot {
    /// Get the total number of deposits rejected.
    pub fn deposits_rejected(&self) -> u64 {
        self.weekly_limit_rejections
            .saturating_add(self.daily_limit_rejections)
            .saturating_add(self.daily_count_rejections)
    }

    /// Get the total number of deposits processed (accepted + rejected).
    pub fn total_deposits(&self) -> u64 {
        self.deposits_accepted
            .saturating_add(self.deposits_rejected())
    }

    /// Calculate the rejection rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no deposits have been processed.
    pub fn rejection_rate(&self) -> f64 {
        let total = self.total_deposits();
        if total == 0 {
            0.0
        } else {
            self.deposits_rejected() as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initial_state() {
        let metrics = Metrics::new();
        assert_eq!(metrics.deposits_accepted(), 0);
        assert_eq!(metrics.deposits_rejected(), 0);
        assert_eq!(metrics.accounts_opened(), 0);
    }

    #[test]
    fn test_record_rejected_per_ceiling() {
        let metrics = Metrics::new();
        metrics.record_rejected(LimitViolation::WeeklyVelocity);
        metrics.record_rejected(LimitViolation::DailyCount);
        metrics.record_rejected(LimitViolation::DailyCount);

        assert_eq!(metrics.rejections(LimitViolation::WeeklyVelocity), 1);
        assert_eq!(metrics.rejections(LimitViolation::DailyVelocity), 0);
        assert_eq!(metrics.rejections(LimitViolation::DailyCount), 2);
        assert_eq!(metrics.deposits_rejected(), 3);
    }

    #[test]
    fn test_record_reset() {
        let metrics = Metrics::new();
        metrics.record_reset(WindowReset::None);
        metrics.record_reset(WindowReset::Daily);
        metrics.record_reset(WindowReset::Weekly);
        metrics.record_reset(WindowReset::Weekly);

        assert_eq!(metrics.daily_resets(), 1);
        assert_eq!(metrics.weekly_resets(), 2);
    }

    #[test]
    fn test_snapshot() {
        let metrics = Metrics::new();
        metrics.record_accepted();
        metrics.record_accepted();
        metrics.record_rejected(LimitViolation::DailyVelocity);
        metrics.record_account_opened();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.deposits_accepted, 2);
        assert_eq!(snapshot.daily_limit_rejections, 1);
        assert_eq!(snapshot.deposits_rejected(), 1);
        assert_eq!(snapshot.total_deposits(), 3);
        assert_eq!(snapshot.accounts_opened, 1);
    }

    #[test]
    fn test_snapshot_rejection_rate() {
        let metrics = Metrics::new();

        assert_eq!(metrics.snapshot().rejection_rate(), 0.0);

        metrics.record_accepted();
        assert_eq!(metrics.snapshot().rejection_rate(), 0.0);

        metrics.record_rejected(LimitViolation::DailyCount);
        assert!((metrics.snapshot().rejection_rate() - 0.5).abs() < f64::EPSILON);

        metrics.record_rejected(LimitViolation::WeeklyVelocity);
        metrics.record_rejected(LimitViolation::DailyVelocity);
        assert!((metrics.snapshot().rejection_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();
        metrics.record_accepted();
        metrics.record_rejected(LimitViolation::DailyCount);
        metrics.record_reset(WindowReset::Weekly);
        metrics.record_account_opened();

        metrics.reset();
        assert_eq!(metrics.snapshot(), Metrics::new().snapshot());
    }

    #[test]
    fn test_metrics_clone_shares_counters() {
        let metrics1 = Metrics::new();
        metrics1.record_accepted();

        let metrics2 = metrics1.clone();
        metrics2.record_accepted();

        assert_eq!(metrics1.deposits_accepted(), 2);
        assert_eq!(metrics2.deposits_accepted(), 2);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::thread;

        let metrics = Metrics::new();
        let mut handles = vec![];

        for _ in 0..10 {
            let m = metrics.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    m.record_accepted();
                    m.record_rejected(LimitViolation::DailyVelocity);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.deposits_accepted(), 1000);
        assert_eq!(metrics.deposits_rejected(), 1000);
    }
}
