//! Turns decoded response rows into ordered [`QueryOutcome`]s.
//!
//! Small responses are decoded inline. Larger ones are spread over scoped
//! threads: each row travels with its position, and the collector writes
//! every outcome into a pre-sized slot so output order equals response order
//! whatever order the workers finish in.

use crossbeam_channel::bounded;
use rmpv::Value;
use std::thread;
use tokio_util::sync::CancellationToken;
use vector::{codec, QueryOutcome, VectorError};

use crate::error::{PipelineError, PipelineResult};
use crate::pool::ScratchPools;
use crate::settings::{MalformedPolicy, PipelineSettings};

/// Ordered outcomes plus how many rows the skip policy dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    pub outcomes: Vec<QueryOutcome>,
    pub skipped: usize,
}

/// Decodes query result rows with [`codec::decode_outcome`].
pub fn assemble(
    rows: &[Vec<Value>],
    include_vectors: bool,
    settings: &PipelineSettings,
    pools: &ScratchPools,
    cancel: &CancellationToken,
) -> PipelineResult<Assembly> {
    assemble_with(rows, settings, pools, cancel, |fields, scratch| {
        codec::decode_outcome(fields, include_vectors, scratch)
    })
}

/// [`assemble`] with a caller-supplied row decoder.
pub fn assemble_with<F>(
    rows: &[Vec<Value>],
    settings: &PipelineSettings,
    pools: &ScratchPools,
    cancel: &CancellationToken,
    decode: F,
) -> PipelineResult<Assembly>
where
    F: Fn(&[Value], &mut Vec<u8>) -> Result<QueryOutcome, VectorError> + Sync,
{
    let workers = settings.parallelism.min(rows.len());
    if rows.len() <= settings.decode_threshold || workers <= 1 {
        return assemble_sequential(rows, settings.malformed_policy, pools, decode);
    }
    assemble_concurrent(rows, workers, settings.malformed_policy, pools, cancel, &decode)
}

/// What a single row turned into.
enum RowOutcome {
    Decoded(QueryOutcome),
    Skipped,
}

fn classify(
    position: usize,
    decoded: Result<QueryOutcome, VectorError>,
    policy: MalformedPolicy,
) -> PipelineResult<RowOutcome> {
    match decoded {
        Ok(outcome) => Ok(RowOutcome::Decoded(outcome)),
        Err(VectorError::MalformedTuple { actual, .. }) => match policy {
            MalformedPolicy::Skip => {
                tracing::warn!(position, fields = actual, "skipping malformed result");
                Ok(RowOutcome::Skipped)
            }
            MalformedPolicy::Reject => Err(PipelineError::MalformedResult {
                position,
                fields: actual,
            }),
        },
        Err(err) => Err(PipelineError::Decode(err)),
    }
}

fn assemble_sequential<F>(
    rows: &[Vec<Value>],
    policy: MalformedPolicy,
    pools: &ScratchPools,
    decode: F,
) -> PipelineResult<Assembly>
where
    F: Fn(&[Value], &mut Vec<u8>) -> Result<QueryOutcome, VectorError>,
{
    let mut scratch = pools.scratch.acquire();
    let mut assembly = Assembly {
        outcomes: Vec::with_capacity(rows.len()),
        skipped: 0,
    };

    for (position, fields) in rows.iter().enumerate() {
        match classify(position, decode(fields.as_slice(), &mut *scratch), policy)? {
            RowOutcome::Decoded(outcome) => assembly.outcomes.push(outcome),
            RowOutcome::Skipped => assembly.skipped += 1,
        }
    }
    Ok(assembly)
}

fn assemble_concurrent<F>(
    rows: &[Vec<Value>],
    workers: usize,
    policy: MalformedPolicy,
    pools: &ScratchPools,
    cancel: &CancellationToken,
    decode: &F,
) -> PipelineResult<Assembly>
where
    F: Fn(&[Value], &mut Vec<u8>) -> Result<QueryOutcome, VectorError> + Sync,
{
    let total = rows.len();
    let stop = cancel.child_token();
    let mut slots: Vec<Option<QueryOutcome>> = vec![None; total];
    let mut received = 0usize;
    let mut skipped = 0usize;
    let mut failure: Option<(usize, PipelineError)> = None;

    thread::scope(|scope| {
        let (work_tx, work_rx) = bounded::<usize>(workers);
        let (result_tx, result_rx) =
            bounded::<(usize, Result<QueryOutcome, VectorError>)>(workers);

        let dispatch_stop = stop.clone();
        scope.spawn(move || {
            for position in 0..total {
                if dispatch_stop.is_cancelled() || work_tx.send(position).is_err() {
                    break;
                }
            }
        });

        for _ in 0..workers {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                let mut scratch = pools.scratch.acquire();
                for position in work_rx.iter() {
                    let decoded = decode(rows[position].as_slice(), &mut *scratch);
                    if result_tx.send((position, decoded)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(work_rx);
        drop(result_tx);

        for (position, decoded) in result_rx.iter() {
            received += 1;
            match classify(position, decoded, policy) {
                Ok(RowOutcome::Decoded(outcome)) => slots[position] = Some(outcome),
                Ok(RowOutcome::Skipped) => skipped += 1,
                Err(err) => {
                    stop.cancel();
                    // Keep the lowest position so the reported row matches
                    // what an in-order scan would have hit first.
                    if failure.as_ref().map_or(true, |(first, _)| position < *first) {
                        failure = Some((position, err));
                    }
                }
            }
        }
    });

    if let Some((_, err)) = failure {
        return Err(err);
    }
    if received < total {
        return Err(PipelineError::Cancelled);
    }

    tracing::debug!(rows = total, workers, skipped, "assembled results concurrently");
    Ok(Assembly {
        outcomes: slots.into_iter().flatten().collect(),
        skipped,
    })
}
