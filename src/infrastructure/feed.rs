//! Transaction feed reader.
//!
//! Reads one JSON object per line:
//!
//! ```text
//! {"id":"15887","customer_id":"528","load_amount":"$3318.47","time":"2000-01-01T00:00:00Z"}
//! ```
//!
//! Amounts are parsed from their textual currency form, timestamps from
//! RFC 3339. A record whose id was already seen is dropped with a warning, so
//! the limiter never sees the same transaction twice.

use crate::domain::transaction::{Transaction, TransactionId};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::BufRead;
use std::str::FromStr;
use tracing::warn;

/// Error returned when an amount cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The text is not a decimal number
    NotNumeric(String),
    /// The amount is zero or negative
    NonPositive(Decimal),
}

impl std::fmt::Display for AmountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmountError::NotNumeric(raw) => write!(f, "amount {:?} is not numeric", raw),
            AmountError::NonPositive(amount) => {
                write!(f, "amount {} must be greater than 0", amount)
            }
        }
    }
}

impl std::error::Error for AmountError {}

/// Error returned when the feed cannot produce a transaction.
#[derive(Debug)]
pub enum FeedError {
    /// Reading from the underlying source failed
    Io(std::io::Error),
    /// A line is not a valid transaction record
    Malformed {
        /// 1-based line number
        line: usize,
        /// Parser error
        source: serde_json::Error,
    },
    /// A record's amount is unusable
    Amount {
        /// 1-based line number
        line: usize,
        /// Transaction id of the record
        transaction_id: TransactionId,
        /// What is wrong with the amount
        source: AmountError,
    },
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::Io(e) => write!(f, "failed to read transaction feed: {}", e),
            FeedError::Malformed { line, source } => {
                write!(f, "malformed transaction on line {}: {}", line, source)
            }
            FeedError::Amount {
                line,
                transaction_id,
                source,
            } => write!(
                f,
                "invalid amount for transaction {} on line {}: {}",
                transaction_id, line, source
            ),
        }
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeedError::Io(e) => Some(e),
            FeedError::Malformed { source, .. } => Some(source),
            FeedError::Amount { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for FeedError {
    fn from(e: std::io::Error) -> Self {
        FeedError::Io(e)
    }
}

/// Parse a currency amount such as `"$1,234.56"`.
///
/// A leading `$` and thousands separators are accepted. The amount must be a
/// positive decimal.
///
/// # Errors
/// Returns `AmountError` for non-numeric or non-positive amounts.
pub fn parse_amount(raw: &str) -> Result<Decimal, AmountError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('$').unwrap_or(trimmed).replace(',', "");

    let amount =
        Decimal::from_str(&digits).map_err(|_| AmountError::NotNumeric(raw.to_string()))?;
    if amount <= Decimal::ZERO {
        return Err(AmountError::NonPositive(amount));
    }
    Ok(amount)
}

#[derive(Debug, Deserialize)]
struct FeedRecord {
    id: TransactionId,
    customer_id: String,
    load_amount: String,
    time: DateTime<FixedOffset>,
}

/// Iterator over the transactions in a JSON-lines feed.
///
/// Yields transactions in feed order. Blank lines are skipped and duplicate
/// ids are dropped; anything unparsable is yielded as an error and the
/// caller decides whether to stop.
pub struct TransactionFeed<R> {
    reader: R,
    buffer: String,
    line: usize,
    seen: HashSet<TransactionId>,
    duplicates: usize,
}

impl<R: BufRead> TransactionFeed<R> {
    /// Create a feed over a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
            line: 0,
            seen: HashSet::new(),
            duplicates: 0,
        }
    }

    /// Number of duplicate records dropped so far.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Number of lines read so far.
    pub fn lines_read(&self) -> usize {
        self.line
    }

    fn parse_line(&self, text: &str) -> Result<Transaction, FeedError> {
        let record: FeedRecord =
            serde_json::from_str(text).map_err(|source| FeedError::Malformed {
                line: self.line,
                source,
            })?;

        let amount = parse_amount(&record.load_amount).map_err(|source| FeedError::Amount {
            line: self.line,
            transaction_id: record.id.clone(),
            source,
        })?;

        Ok(Transaction::new(
            record.id,
            record.customer_id,
            amount,
            record.time,
        ))
    }
}

impl<R: BufRead> Iterator for TransactionFeed<R> {
    type Item = Result<Transaction, FeedError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(e) => return Some(Err(FeedError::Io(e))),
            }

            let text = self.buffer.trim();
            if text.is_empty() {
                continue;
            }

            let transaction = match self.parse_line(text) {
                Ok(transaction) => transaction,
                Err(e) => return Some(Err(e)),
            };

            if !self.seen.insert(transaction.id.clone()) {
                self.duplicates += 1;
                warn!(
                    transaction_id = %transaction.id,
                    customer_id = %transaction.customer_id,
                    line = self.line,
                    "Duplicate transaction id, skipping"
                );
                continue;
            }

            return Some(Ok(transaction));
        }
    }
}
