//! Outcome verification against an expected-results feed.
//!
//! The expected feed has the same line shape as the limiter's output:
//!
//! ```text
//! {"id":"15887","customer_id":"528","accepted":true}
//! ```
//!
//! Expectations are indexed by `(id, customer_id)`, so the two feeds only
//! have to agree on content, not on line positions. Verification stops at
//! the first disagreement and reports the full account for diagnosis.

use crate::domain::account::Account;
use crate::domain::outcome::{DepositOutcome, OutcomeRecord};
use crate::domain::transaction::{CustomerId, TransactionId};
use std::collections::HashMap;
use std::io::BufRead;

/// Error returned when verification fails.
#[derive(Debug)]
pub enum VerificationError {
    /// Reading the expected feed failed
    Io(std::io::Error),
    /// A line of the expected feed is not a valid record
    Malformed {
        /// 1-based line number
        line: usize,
        /// Parser error
        source: serde_json::Error,
    },
    /// The expected feed lists the transaction under another customer
    CustomerMismatch {
        /// Offending transaction
        transaction_id: TransactionId,
        /// Customer in the expected feed
        expected: CustomerId,
        /// Customer the limiter processed
        actual: CustomerId,
    },
    /// The expected feed has no entry for the transaction
    MissingExpectation {
        /// Offending transaction
        transaction_id: TransactionId,
        /// Customer the limiter processed
        customer_id: CustomerId,
    },
    /// The limiter decided differently than expected
    DecisionMismatch {
        /// Offending transaction
        transaction_id: TransactionId,
        /// Expected acceptance
        expected: bool,
        /// Actual acceptance
        actual: bool,
        /// Account state after the limiter's decision
        account: Box<Account>,
    },
}

impl std::fmt::Display for VerificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationError::Io(e) => write!(f, "failed to read expected outcomes: {}", e),
            VerificationError::Malformed { line, source } => {
                write!(f, "malformed expected outcome on line {}: {}", line, source)
            }
            VerificationError::CustomerMismatch {
                transaction_id,
                expected,
                actual,
            } => write!(
                f,
                "transaction {} belongs to customer {} in the expected outcomes, but was processed for customer {}",
                transaction_id, expected, actual
            ),
            VerificationError::MissingExpectation {
                transaction_id,
                customer_id,
            } => write!(
                f,
                "no expected outcome for transaction {} of customer {}",
                transaction_id, customer_id
            ),
            VerificationError::DecisionMismatch {
                transaction_id,
                expected,
                actual,
                account,
            } => {
                write!(
                    f,
                    "transaction {}: expected accepted={}, got accepted={} \
                     (customer {}, balance {}, daily count {}, daily velocity {}, weekly velocity {}, last deposit ",
                    transaction_id,
                    expected,
                    actual,
                    account.customer_id(),
                    account.balance(),
                    account.daily_deposit_count(),
                    account.daily_deposit_velocity(),
                    account.weekly_deposit_velocity(),
                )?;
                match account.last_accepted_deposit() {
                    Some(last) => write!(f, "{} at {})", last.id, last.timestamp.to_rfc3339()),
                    None => write!(f, "none)"),
                }
            }
        }
    }
}

impl std::error::Error for VerificationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VerificationError::Io(e) => Some(e),
            VerificationError::Malformed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for VerificationError {
    fn from(e: std::io::Error) -> Self {
        VerificationError::Io(e)
    }
}

/// Expected decisions keyed by transaction and customer.
#[derive(Debug, Clone, Default)]
pub struct ExpectedOutcomes {
    by_key: HashMap<(TransactionId, CustomerId), bool>,
    customer_by_id: HashMap<TransactionId, CustomerId>,
}

impl ExpectedOutcomes {
    /// Read expectations from a JSON-lines source. Blank lines are skipped.
    ///
    /// # Errors
    /// Returns `VerificationError` on read failure or a malformed line.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, VerificationError> {
        let mut expected = Self::default();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: OutcomeRecord = serde_json::from_str(&line).map_err(|source| {
                VerificationError::Malformed {
                    line: index + 1,
                    source,
                }
            })?;
            expected.insert(record);
        }
        Ok(expected)
    }

    /// Add one expectation. A later record for the same key replaces it.
    pub fn insert(&mut self, record: OutcomeRecord) {
        self.customer_by_id
            .insert(record.id.clone(), record.customer_id.clone());
        self.by_key
            .insert((record.id, record.customer_id), record.accepted);
    }

    /// Number of expectations not yet matched.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Check if every expectation has been matched.
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    fn take(&mut self, transaction_id: &str, customer_id: &str) -> Option<bool> {
        self.by_key
            .remove(&(transaction_id.to_owned(), customer_id.to_owned()))
    }

    fn customer_of(&self, transaction_id: &str) -> Option<&CustomerId> {
        self.customer_by_id.get(transaction_id)
    }
}

impl FromIterator<OutcomeRecord> for ExpectedOutcomes {
    fn from_iter<I: IntoIterator<Item = OutcomeRecord>>(iter: I) -> Self {
        let mut expected = Self::default();
        for record in iter {
            expected.insert(record);
        }
        expected
    }
}

/// Summary of a successful verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationReport {
    /// Outcomes checked
    pub checked: usize,
    /// Of those, accepted deposits
    pub accepted: usize,
    /// Of those, rejected deposits
    pub rejected: usize,
    /// Expectations never matched by any outcome
    pub unmatched: usize,
}

/// Compares limiter outcomes against expected outcomes, one at a time.
#[derive(Debug)]
pub struct OutcomeVerifier {
    expected: ExpectedOutcomes,
    accepted: usize,
    rejected: usize,
}

impl OutcomeVerifier {
    /// Create a verifier over a set of expectations.
    pub fn new(expected: ExpectedOutcomes) -> Self {
        Self {
            expected,
            accepted: 0,
            rejected: 0,
        }
    }

    /// Check one outcome against its expectation.
    ///
    /// # Errors
    /// Returns the first disagreement found.
    pub fn verify(&mut self, outcome: &DepositOutcome) -> Result<(), VerificationError> {
        let Some(expected) = self
            .expected
            .take(&outcome.transaction_id, &outcome.customer_id)
        else {
            return Err(match self.expected.customer_of(&outcome.transaction_id) {
                Some(expected) if *expected != outcome.customer_id => {
                    VerificationError::CustomerMismatch {
                        transaction_id: outcome.transaction_id.clone(),
                        expected: expected.clone(),
                        actual: outcome.customer_id.clone(),
                    }
                }
                _ => VerificationError::MissingExpectation {
                    transaction_id: outcome.transaction_id.clone(),
                    customer_id: outcome.customer_id.clone(),
                },
            });
        };

        if expected != outcome.accepted() {
            return Err(VerificationError::DecisionMismatch {
                transaction_id: outcome.transaction_id.clone(),
                expected,
                actual: outcome.accepted(),
                account: Box::new(outcome.account.clone()),
            });
        }

        if outcome.accepted() {
            self.accepted += 1;
        } else {
            self.rejected += 1;
        }
        Ok(())
    }

    /// Finish verification and summarize.
    pub fn finish(self) -> VerificationReport {
        VerificationReport {
            checked: self.accepted + self.rejected,
            accepted: self.accepted,
            rejected: self.rejected,
            unmatched: self.expected.len(),
        }
    }
}
