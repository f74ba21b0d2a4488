//! Bounded async worker pool for upsert sub-batches.
//!
//! A dispatcher task feeds units into a queue sized to the worker count, in
//! their original order. Exactly `workers` tasks pull from that queue until it
//! closes. Every outcome lands on a result channel that is only inspected
//! after all tasks have been joined.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, PipelineResult};

/// What happened to a set of units that all succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionReport {
    pub total: usize,
    pub workers: usize,
}

/// Runs `work(index, unit)` for every unit on `workers` tasks.
///
/// Succeeds only when every unit succeeded. On failure the first reported
/// error is returned inside [`PipelineError::SubBatch`], along with how many
/// units failed. If `cancel` fires during dispatch, undispatched units are
/// never started and the call fails with [`PipelineError::Cancelled`].
pub async fn execute<T, W, Fut>(
    units: Vec<T>,
    workers: usize,
    cancel: &CancellationToken,
    work: W,
) -> PipelineResult<ExecutionReport>
where
    T: Send + 'static,
    W: Fn(usize, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PipelineResult<()>> + Send + 'static,
{
    let total = units.len();
    if total == 0 {
        return Ok(ExecutionReport { total, workers: 0 });
    }
    let workers = workers.clamp(1, total);

    let (queue_tx, queue_rx) = mpsc::channel::<(usize, T)>(workers);
    let queue_rx = Arc::new(Mutex::new(queue_rx));
    let (result_tx, mut result_rx) = mpsc::channel::<(usize, PipelineResult<()>)>(total);
    let work = Arc::new(work);

    let dispatch_cancel = cancel.clone();
    let dispatcher = tokio::spawn(async move {
        let mut dispatched = 0usize;
        for (index, unit) in units.into_iter().enumerate() {
            if dispatch_cancel.is_cancelled() {
                break;
            }
            tokio::select! {
                biased;
                _ = dispatch_cancel.cancelled() => break,
                sent = queue_tx.send((index, unit)) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
            dispatched += 1;
        }
        dispatched
    });

    let mut tasks = JoinSet::new();
    for worker in 0..workers {
        let queue_rx = Arc::clone(&queue_rx);
        let result_tx = result_tx.clone();
        let work = Arc::clone(&work);
        tasks.spawn(async move {
            loop {
                let next = queue_rx.lock().await.recv().await;
                let Some((index, unit)) = next else {
                    break;
                };
                let outcome = work(index, unit).await;
                match &outcome {
                    Ok(()) => tracing::debug!(worker, sub_batch = index, "sub-batch done"),
                    Err(err) => {
                        tracing::warn!(worker, sub_batch = index, error = %err, "sub-batch failed")
                    }
                }
                if result_tx.send((index, outcome)).await.is_err() {
                    break;
                }
            }
        });
    }
    // Only workers hold the queue now, so the dispatcher's sends fail once
    // every worker has exited.
    drop(queue_rx);
    drop(result_tx);

    let mut panicked = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            panicked.push(PipelineError::Worker(err.to_string()));
        }
    }
    let dispatched = match dispatcher.await {
        Ok(count) => count,
        Err(err) => return Err(PipelineError::Worker(err.to_string())),
    };

    let mut first: Option<(usize, PipelineError)> = None;
    let mut failed = 0usize;
    let mut only_cancellations = true;
    while let Some((index, outcome)) = result_rx.recv().await {
        if let Err(err) = outcome {
            failed += 1;
            only_cancellations &= matches!(err, PipelineError::Cancelled);
            if first.is_none() {
                first = Some((index, err));
            }
        }
    }
    for err in panicked {
        failed += 1;
        only_cancellations = false;
        if first.is_none() {
            first = Some((total, err));
        }
    }

    let cancelled = cancel.is_cancelled();
    match first {
        Some(_) if cancelled && only_cancellations => Err(PipelineError::Cancelled),
        Some((index, source)) => Err(PipelineError::SubBatch {
            index,
            failed,
            total,
            source: Box::new(source),
        }),
        None if dispatched < total => Err(PipelineError::Cancelled),
        None => Ok(ExecutionReport { total, workers }),
    }
}
