//! Multi-partition writes as a sequence of single-partition batches.
//!
//! The backing store only offers atomic batches within one partition. A
//! write spanning partitions is split into one group per partition, and the
//! groups are submitted strictly in sequence. The first failing group stops
//! the run: earlier groups stay applied, later groups are never submitted.
//!
//! ```text
//!            next_pending()          complete()
//!  Pending ────────────────▶ in flight ──────────▶ Pending / Completed
//!                                │
//!                                │ fail(cause)
//!                                ▼
//!                              Failed
//! ```

use crate::error::{CoreError, CoreResult};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use tracing::{debug, warn};

/// The operations of one partition.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionGroup<Op> {
    /// The partition key shared by every operation.
    pub partition_key: String,
    /// Operations in submission order.
    pub operations: Vec<Op>,
}

/// Where a [`PartitionBatches`] run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Groups remain to be submitted, or one is in flight.
    Pending,
    /// Every group was applied.
    Completed,
    /// A group failed; later groups were not attempted.
    Failed,
}

/// Outcome of a fully applied multi-partition write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Partitions applied, in submission order.
    pub partitions: Vec<String>,
    /// Total number of operations applied.
    pub operations: usize,
}

/// Tracks the groups of a multi-partition write.
#[derive(Debug)]
pub struct PartitionBatches<Op> {
    pending: VecDeque<PartitionGroup<Op>>,
    in_flight: Option<(String, usize)>,
    completed: Vec<String>,
    operations_completed: usize,
    failure: Option<(String, CoreError)>,
}

impl<Op> PartitionBatches<Op> {
    /// Groups `(partition_key, operation)` pairs by partition.
    ///
    /// Groups are ordered by the first appearance of their partition key and
    /// keep the input order of their operations.
    pub fn group_by_partition<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (String, Op)>,
    {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<PartitionGroup<Op>> = Vec::new();

        for (partition_key, op) in items {
            match index.get(&partition_key) {
                Some(&i) => groups[i].operations.push(op),
                None => {
                    index.insert(partition_key.clone(), groups.len());
                    groups.push(PartitionGroup {
                        partition_key,
                        operations: vec![op],
                    });
                }
            }
        }

        Self {
            pending: groups.into(),
            in_flight: None,
            completed: Vec::new(),
            operations_completed: 0,
            failure: None,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> BatchState {
        if self.failure.is_some() {
            BatchState::Failed
        } else if self.pending.is_empty() && self.in_flight.is_none() {
            BatchState::Completed
        } else {
            BatchState::Pending
        }
    }

    /// Number of groups not yet submitted.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Partitions applied so far.
    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    /// Takes the next group to submit.
    ///
    /// Returns `None` once the run failed, while a group is still in flight,
    /// or when no groups remain.
    pub fn next_pending(&mut self) -> Option<PartitionGroup<Op>> {
        if self.failure.is_some() || self.in_flight.is_some() {
            return None;
        }
        let group = self.pending.pop_front()?;
        self.in_flight = Some((group.partition_key.clone(), group.operations.len()));
        Some(group)
    }

    /// Marks the in-flight group as applied.
    pub fn complete(&mut self) {
        if let Some((partition_key, count)) = self.in_flight.take() {
            self.completed.push(partition_key);
            self.operations_completed += count;
        }
    }

    /// Marks the in-flight group as failed, stopping the run.
    ///
    /// Does nothing when no group is in flight.
    pub fn fail(&mut self, cause: CoreError) {
        if let Some((partition_key, _)) = self.in_flight.take() {
            self.failure = Some((partition_key, cause));
        }
    }

    /// Converts a finished run into its result.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BatchAborted`] for a failed run, and
    /// `InvalidOperation` if the run has not finished.
    pub fn into_result(self) -> CoreResult<BatchSummary> {
        if let Some((failed_partition, cause)) = self.failure {
            return Err(CoreError::BatchAborted {
                failed_partition,
                completed: self.completed,
                not_attempted: self
                    .pending
                    .into_iter()
                    .map(|group| group.partition_key)
                    .collect(),
                source: Box::new(cause),
            });
        }
        if !self.pending.is_empty() || self.in_flight.is_some() {
            return Err(CoreError::invalid_operation(
                "partition batches still have groups to submit",
            ));
        }
        Ok(BatchSummary {
            partitions: self.completed,
            operations: self.operations_completed,
        })
    }

    /// Submits every group in sequence, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BatchAborted`] if a group fails.
    pub async fn run<F, Fut>(mut self, mut submit: F) -> CoreResult<BatchSummary>
    where
        F: FnMut(PartitionGroup<Op>) -> Fut,
        Fut: Future<Output = CoreResult<()>>,
    {
        while let Some(group) = self.next_pending() {
            let partition_key = group.partition_key.clone();
            let count = group.operations.len();
            match submit(group).await {
                Ok(()) => {
                    debug!(%partition_key, count, "partition group applied");
                    self.complete();
                }
                Err(cause) => {
                    warn!(
                        %partition_key,
                        completed = self.completed.len(),
                        not_attempted = self.pending.len(),
                        error = %cause,
                        "partition group failed, stopping"
                    );
                    self.fail(cause);
                    break;
                }
            }
        }
        self.into_result()
    }
}
