//! Per-transaction outcomes.
//!
//! Every processed transaction yields exactly one outcome: the decision plus
//! the account as it stands after that decision.

use crate::domain::account::{Account, DepositEvaluation};
use crate::domain::policy::DepositDecision;
use crate::domain::transaction::{CustomerId, Transaction, TransactionId};
use crate::domain::window::WindowReset;
use serde::{Deserialize, Serialize};

/// Decision for one transaction with the post-decision account snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositOutcome {
    /// Transaction this outcome belongs to
    pub transaction_id: TransactionId,
    /// Customer the transaction was credited to
    pub customer_id: CustomerId,
    /// Window reset applied before evaluation
    pub reset: WindowReset,
    /// Accept, or reject with the violated ceiling
    pub decision: DepositDecision,
    /// Account state after the decision
    pub account: Account,
}

impl DepositOutcome {
    /// Assemble an outcome from an evaluation and the resulting account.
    pub fn new(transaction: &Transaction, evaluation: DepositEvaluation, account: Account) -> Self {
        Self {
            transaction_id: transaction.id.clone(),
            customer_id: transaction.customer_id.clone(),
            reset: evaluation.reset,
            decision: evaluation.decision,
            account,
        }
    }

    /// Check if the deposit was accepted.
    pub fn accepted(&self) -> bool {
        self.decision.is_accept()
    }

    /// The line-level record for this outcome.
    pub fn to_record(&self) -> OutcomeRecord {
        OutcomeRecord {
            id: self.transaction_id.clone(),
            customer_id: self.customer_id.clone(),
            accepted: self.accepted(),
        }
    }
}

/// Wire form of an outcome, one JSON object per line.
///
/// ```text
/// {"id":"15887","customer_id":"528","accepted":true}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// Transaction id
    pub id: TransactionId,
    /// Customer id
    pub customer_id: CustomerId,
    /// Whether the deposit was accepted
    pub accepted: bool,
}
