//! Parallel processing partitioned by customer.
//!
//! Decisions for one customer depend on the order of that customer's
//! deposits, and on nothing else. Every transaction of a customer is routed
//! to the same worker, so each worker sees its customers' deposits in feed
//! order while different customers proceed in parallel.

use crate::application::limiter::DepositLimiter;
use crate::application::ports::AccountStore;
use crate::domain::outcome::DepositOutcome;
use crate::domain::transaction::Transaction;
use ahash::RandomState;
use std::num::NonZeroUsize;
use std::thread;
use tracing::debug;

/// Fixed seeds so a customer lands on the same worker in every run.
const PARTITION_SEEDS: (u64, u64, u64, u64) = (
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
);

/// Assigns customers to workers.
#[derive(Clone)]
pub struct CustomerPartitioner {
    hasher: RandomState,
    workers: NonZeroUsize,
}

impl CustomerPartitioner {
    /// Create a partitioner over `workers` buckets.
    pub fn new(workers: NonZeroUsize) -> Self {
        let (k0, k1, k2, k3) = PARTITION_SEEDS;
        Self {
            hasher: RandomState::with_seeds(k0, k1, k2, k3),
            workers,
        }
    }

    /// Bucket for a customer, in `0..workers`.
    pub fn partition_of(&self, customer_id: &str) -> usize {
        (self.hasher.hash_one(customer_id) % self.workers.get() as u64) as usize
    }

    /// Split transactions into per-worker queues, remembering feed positions.
    ///
    /// Each queue keeps the relative order of its transactions.
    pub fn split(&self, transactions: Vec<Transaction>) -> Vec<Vec<(usize, Transaction)>> {
        let mut partitions: Vec<Vec<(usize, Transaction)>> =
            (0..self.workers.get()).map(|_| Vec::new()).collect();
        for (position, transaction) in transactions.into_iter().enumerate() {
            let bucket = self.partition_of(&transaction.customer_id);
            partitions[bucket].push((position, transaction));
        }
        partitions
    }
}

/// Process transactions on `workers` threads, partitioned by customer.
///
/// Outcomes are returned in feed order and equal what
/// [`DepositLimiter::process_all`] would produce for the same input.
///
/// # Panics
/// Re-raises a panic from any worker thread.
pub fn process_partitioned<S>(
    limiter: &DepositLimiter<S>,
    transactions: Vec<Transaction>,
    workers: NonZeroUsize,
) -> Vec<DepositOutcome>
where
    S: AccountStore + Clone,
{
    if workers.get() == 1 || transactions.len() < 2 {
        return limiter.process_all(transactions);
    }

    let total = transactions.len();
    let partitions = CustomerPartitioner::new(workers).split(transactions);
    debug!(
        transactions = total,
        workers = workers.get(),
        "Processing deposits in parallel"
    );

    let mut outcomes: Vec<Option<DepositOutcome>> = (0..total).map(|_| None).collect();
    thread::scope(|scope| {
        let handles: Vec<_> = partitions
            .into_iter()
            .filter(|partition| !partition.is_empty())
            .map(|partition| {
                scope.spawn(move || {
                    partition
                        .into_iter()
                        .map(|(position, transaction)| (position, limiter.process(&transaction)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(processed) => {
                    for (position, outcome) in processed {
                        outcomes[position] = Some(outcome);
                    }
                }
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
    });

    outcomes.into_iter().flatten().collect()
}
