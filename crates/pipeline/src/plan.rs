//! Sequential vs. concurrent execution strategy for an upsert batch.

use std::ops::Range;

use crate::error::{PipelineError, PipelineResult};
use crate::settings::PipelineSettings;

/// How a batch of `len` records will be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchPlan {
    /// Nothing to send.
    Empty,
    /// One request carrying the whole batch.
    Sequential { len: usize },
    /// `workers` tasks share `sub_batches`, each at most `sub_batch_size` long.
    Concurrent {
        workers: usize,
        sub_batch_size: usize,
        sub_batches: Vec<Range<usize>>,
    },
}

impl BatchPlan {
    /// Number of transport calls the plan will issue.
    pub fn request_count(&self) -> usize {
        match self {
            BatchPlan::Empty => 0,
            BatchPlan::Sequential { .. } => 1,
            BatchPlan::Concurrent { sub_batches, .. } => sub_batches.len(),
        }
    }

    pub fn workers(&self) -> usize {
        match self {
            BatchPlan::Empty => 0,
            BatchPlan::Sequential { .. } => 1,
            BatchPlan::Concurrent { workers, .. } => *workers,
        }
    }
}

/// Picks a strategy for `len` records.
///
/// Oversized batches are rejected before any planning happens. Above the
/// sequential threshold, `workers = min(parallelism, ceil(len / 2))` and each
/// sub-batch holds `ceil(len / workers)` records, capped at
/// `settings.sub_batch_cap`. Rounding can leave fewer sub-batches than
/// workers; the worker count is then lowered to match.
pub fn plan(len: usize, settings: &PipelineSettings) -> PipelineResult<BatchPlan> {
    if len > settings.max_batch {
        return Err(PipelineError::BatchTooLarge {
            len,
            max: settings.max_batch,
        });
    }
    if len == 0 {
        return Ok(BatchPlan::Empty);
    }
    if len <= settings.sequential_threshold {
        return Ok(BatchPlan::Sequential { len });
    }

    let parallelism = settings.parallelism.max(1);
    let workers = parallelism.min(len.div_ceil(2));
    let sub_batch_size = len.div_ceil(workers).min(settings.sub_batch_cap.max(1));
    let sub_batches = split(len, sub_batch_size);

    Ok(BatchPlan::Concurrent {
        workers: workers.min(sub_batches.len()),
        sub_batch_size,
        sub_batches,
    })
}

/// Contiguous ranges of at most `size` covering `0..len` in order.
pub fn split(len: usize, size: usize) -> Vec<Range<usize>> {
    let size = size.max(1);
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}
