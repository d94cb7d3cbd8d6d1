//! Deposit transactions as seen by the limiter.
//!
//! A transaction arrives already parsed: the amount is a positive decimal and
//! the timestamp carries its own UTC offset, from which the calendar day and
//! ISO week used for window rollover are derived.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Opaque customer identifier, the key of the account store.
pub type CustomerId = String;

/// Transaction identifier, unique within a feed.
pub type TransactionId = String;

/// A single deposit attempt for a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Feed-unique identifier
    pub id: TransactionId,
    /// Customer the deposit is credited to
    pub customer_id: CustomerId,
    /// Deposit amount, always positive
    pub amount: Decimal,
    /// When the deposit was made, in the offset it was reported in
    pub timestamp: DateTime<FixedOffset>,
}

impl Transaction {
    /// Create a new transaction.
    pub fn new(
        id: impl Into<TransactionId>,
        customer_id: impl Into<CustomerId>,
        amount: Decimal,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: id.into(),
            customer_id: customer_id.into(),
            amount,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_serializes_amount_as_string() {
        let timestamp = DateTime::parse_from_rfc3339("2024-01-01T09:00:00Z").unwrap();
        let tx = Transaction::new("15887", "528", Decimal::new(312_345, 2), timestamp);

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["id"], "15887");
        assert_eq!(json["customer_id"], "528");
        assert_eq!(json["amount"], "3123.45");
    }

    #[test]
    fn test_transaction_keeps_reported_offset() {
        let timestamp = DateTime::parse_from_rfc3339("2024-01-01T23:30:00-05:00").unwrap();
        let tx = Transaction::new("1", "1", Decimal::ONE, timestamp);

        assert_eq!(tx.timestamp.offset().local_minus_utc(), -5 * 3600);
    }
}
