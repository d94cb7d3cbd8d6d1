//! Calendar window rollover.
//!
//! Windows are calendar-local rather than rolling: a day ends at midnight in
//! the timestamp's own offset and a week ends at the ISO-8601 week boundary.
//! Two deposits ten minutes apart that straddle midnight are in different days.

use crate::domain::account::Account;
use chrono::{DateTime, Datelike, TimeZone};
use rust_decimal::Decimal;

/// Which rolling counters must be zeroed before a deposit is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowReset {
    /// Same calendar day as the last accepted deposit, or no deposit yet
    None,
    /// New day within the same week: daily velocity and count are zeroed
    Daily,
    /// New year, month or ISO week: weekly and daily counters are zeroed
    Weekly,
}

impl WindowReset {
    /// Decide the reset needed between the last accepted deposit and an
    /// incoming one.
    ///
    /// The coarse check runs first. Crossing a year, month or ISO week always
    /// crosses a day too, so a weekly reset subsumes the daily one.
    pub fn between<Tz: TimeZone>(
        last_accepted: Option<&DateTime<Tz>>,
        incoming: &DateTime<Tz>,
    ) -> Self {
        let Some(last) = last_accepted else {
            return WindowReset::None;
        };

        if last.year() != incoming.year()
            || last.month() != incoming.month()
            || last.iso_week().week() != incoming.iso_week().week()
        {
            WindowReset::Weekly
        } else if last.day() != incoming.day() {
            WindowReset::Daily
        } else {
            WindowReset::None
        }
    }

    /// Zero the counters this reset covers.
    pub fn apply(self, account: &mut Account) {
        match self {
            WindowReset::None => {}
            WindowReset::Daily => {
                account.daily_deposit_velocity = Decimal::ZERO;
                account.daily_deposit_count = 0;
            }
            WindowReset::Weekly => {
                account.weekly_deposit_velocity = Decimal::ZERO;
                account.daily_deposit_velocity = Decimal::ZERO;
                account.daily_deposit_count = 0;
            }
        }
    }

    /// Check if the daily counters are zeroed by this reset.
    pub fn resets_daily(&self) -> bool {
        !matches!(self, WindowReset::None)
    }

    /// Check if the weekly velocity is zeroed by this reset.
    pub fn resets_weekly(&self) -> bool {
        matches!(self, WindowReset::Weekly)
    }
}

impl std::fmt::Display for WindowReset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowReset::None => write!(f, "none"),
            WindowReset::Daily => write!(f, "daily"),
            WindowReset::Weekly => write!(f, "weekly"),
        }
    }
}
