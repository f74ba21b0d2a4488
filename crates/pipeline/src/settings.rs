use serde::{Deserialize, Serialize};
use std::thread;
use vector::limits::MAX_VECTORS_PER_BATCH;

/// What to do with a query result row that has fewer than five fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Drop the row, log it, and count it in the assembly report.
    #[default]
    Skip,
    /// Fail the whole assembly at the first malformed row.
    Reject,
}

/// Numeric policy for one [`Index`](crate::Index) handle.
///
/// # Example
/// ```
/// use pipeline::{MalformedPolicy, PipelineSettings};
///
/// let settings = PipelineSettings {
///     parallelism: 4,
///     malformed_policy: MalformedPolicy::Reject,
///     ..Default::default()
/// };
/// assert_eq!(settings.sub_batch_cap, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Largest batch accepted by a single upsert call.
    pub max_batch: usize,
    /// Batches at or below this size are sent in one request.
    pub sequential_threshold: usize,
    /// Upper bound on records per concurrent sub-batch.
    pub sub_batch_cap: usize,
    /// Responses at or below this many rows are decoded inline.
    pub decode_threshold: usize,
    /// Worker ceiling for both fan-out stages.
    pub parallelism: usize,
    pub malformed_policy: MalformedPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_batch: MAX_VECTORS_PER_BATCH,
            sequential_threshold: 10,
            sub_batch_cap: 100,
            decode_threshold: 50,
            parallelism: default_parallelism(),
            malformed_policy: MalformedPolicy::Skip,
        }
    }
}

impl PipelineSettings {
    /// Replaces the worker ceiling, keeping it at least one.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.malformed_policy = policy;
        self
    }
}

/// Logical CPUs visible to this process, or 1 when unknown.
pub fn default_parallelism() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
