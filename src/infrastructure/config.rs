//! Limits configuration file.
//!
//! ```json
//! {
//!   "default": { "daily_deposit_limit": "5000", "weekly_deposit_limit": "20000" },
//!   "customers": {
//!     "528": { "daily_deposit_count_limit": 1 }
//!   }
//! }
//! ```
//!
//! Every field is optional. Missing default fields take the built-in values,
//! and missing customer fields take the file's default.

use crate::application::limiter::DepositLimiterBuilder;
use crate::domain::account::DepositLimits;
use crate::domain::transaction::CustomerId;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Error returned when a limits file cannot be loaded.
#[derive(Debug)]
pub enum ConfigError {
    /// Reading the file failed
    Io(std::io::Error),
    /// The file is not valid limits JSON
    Parse(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read limits file: {}", e),
            ConfigError::Parse(e) => write!(f, "invalid limits file: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// A partial set of limits layered over a base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsOverride {
    /// Replacement daily velocity ceiling
    pub daily_deposit_limit: Option<Decimal>,
    /// Replacement weekly velocity ceiling
    pub weekly_deposit_limit: Option<Decimal>,
    /// Replacement daily count ceiling
    pub daily_deposit_count_limit: Option<u32>,
}

impl LimitsOverride {
    /// Apply the fields that are set on top of `base`.
    pub fn over(self, base: DepositLimits) -> DepositLimits {
        DepositLimits {
            daily_deposit_limit: self.daily_deposit_limit.unwrap_or(base.daily_deposit_limit),
            weekly_deposit_limit: self
                .weekly_deposit_limit
                .unwrap_or(base.weekly_deposit_limit),
            daily_deposit_count_limit: self
                .daily_deposit_count_limit
                .unwrap_or(base.daily_deposit_count_limit),
        }
    }

    /// Check if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Default and per-customer limits, as loaded from a file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    #[serde(default)]
    default: LimitsOverride,
    #[serde(default)]
    customers: HashMap<CustomerId, LimitsOverride>,
}

impl LimitsConfig {
    /// Parse a limits document.
    ///
    /// # Errors
    /// Returns `ConfigError` on read failure or invalid JSON.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Load a limits file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be opened or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Layer an override on top of the file's default limits.
    ///
    /// Customer entries inherit the result for fields they leave unset.
    pub fn override_default(mut self, layer: LimitsOverride) -> Self {
        self.default = LimitsOverride {
            daily_deposit_limit: layer.daily_deposit_limit.or(self.default.daily_deposit_limit),
            weekly_deposit_limit: layer
                .weekly_deposit_limit
                .or(self.default.weekly_deposit_limit),
            daily_deposit_count_limit: layer
                .daily_deposit_count_limit
                .or(self.default.daily_deposit_count_limit),
        };
        self
    }

    /// Resolved limits for customers without their own entry.
    pub fn default_limits(&self) -> DepositLimits {
        self.default.over(DepositLimits::default())
    }

    /// Resolved limits for every customer with its own entry.
    pub fn customer_limits(&self) -> HashMap<CustomerId, DepositLimits> {
        let base = self.default_limits();
        self.customers
            .iter()
            .map(|(customer_id, layer)| (customer_id.clone(), layer.over(base)))
            .collect()
    }

    /// Configure a limiter builder with these limits.
    ///
    /// Validation happens when the builder is built.
    pub fn apply(&self, builder: DepositLimiterBuilder) -> DepositLimiterBuilder {
        self.customer_limits().into_iter().fold(
            builder.with_default_limits(self.default_limits()),
            |builder, (customer_id, limits)| builder.with_customer_limits(customer_id, limits),
        )
    }
}
