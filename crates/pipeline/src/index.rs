use bytes::Bytes;
use serde_json::json;
use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vector::{codec, Attributes, Precision, QueryOutcome, SpaceType, VectorRecord};

use crate::assemble::{assemble, Assembly};
use crate::error::{PipelineError, PipelineResult};
use crate::executor;
use crate::plan::{plan, BatchPlan};
use crate::pool::ScratchPools;
use crate::query::QueryRequest;
use crate::settings::PipelineSettings;
use crate::transport::{Transport, TransportRequest};

/// Result of a successful upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertSummary {
    pub records: usize,
    /// Transport calls issued, one per sub-batch.
    pub requests: usize,
    pub workers: usize,
}

/// Handle to one remote index.
///
/// Cheap to clone; clones share the transport and scratch pools.
#[derive(Clone)]
pub struct Index {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    dimension: usize,
    space: SpaceType,
    sparse_dimension: usize,
    precision: Precision,
    transport: Arc<dyn Transport>,
    settings: PipelineSettings,
    pools: ScratchPools,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("name", &self.inner.name)
            .field("dimension", &self.inner.dimension)
            .field("space", &self.inner.space)
            .field("sparse_dimension", &self.inner.sparse_dimension)
            .field("precision", &self.inner.precision)
            .finish_non_exhaustive()
    }
}

/// Everything needed to address an index, minus the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexParams {
    pub name: String,
    pub dimension: usize,
    pub space: SpaceType,
    pub sparse_dimension: usize,
    pub precision: Precision,
}

impl IndexParams {
    pub fn new(name: impl Into<String>, dimension: usize, space: SpaceType) -> Self {
        Self {
            name: name.into(),
            dimension,
            space,
            sparse_dimension: 0,
            precision: Precision::default(),
        }
    }
}

impl Index {
    pub fn new(params: IndexParams, transport: Arc<dyn Transport>, settings: PipelineSettings) -> Self {
        let pools = ScratchPools::new(settings.parallelism);
        Self {
            inner: Arc::new(Inner {
                name: params.name,
                dimension: params.dimension,
                space: params.space,
                sparse_dimension: params.sparse_dimension,
                precision: params.precision,
                transport,
                settings,
                pools,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn dimension(&self) -> usize {
        self.inner.dimension
    }

    pub fn space(&self) -> SpaceType {
        self.inner.space
    }

    pub fn sparse_dimension(&self) -> usize {
        self.inner.sparse_dimension
    }

    /// True when the index stores a sparse component next to the dense one.
    pub fn is_hybrid(&self) -> bool {
        self.inner.sparse_dimension > 0
    }

    pub fn precision(&self) -> Precision {
        self.inner.precision
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.inner.settings
    }

    /// Validates, normalizes, encodes and submits `records`.
    ///
    /// Up to the sequential threshold the batch goes out in one request.
    /// Larger batches are split per [`plan`] and fanned out over a bounded
    /// worker pool; the call fails if any sub-batch fails.
    pub async fn upsert(
        &self,
        records: Vec<VectorRecord>,
        cancel: &CancellationToken,
    ) -> PipelineResult<UpsertSummary> {
        let strategy = plan(records.len(), &self.inner.settings)?;
        validate_batch(&records, self.inner.dimension)?;

        match strategy {
            BatchPlan::Empty => Ok(UpsertSummary {
                records: 0,
                requests: 0,
                workers: 0,
            }),
            BatchPlan::Sequential { len } => {
                tracing::debug!(index = %self.inner.name, records = len, "sequential upsert");
                if cancel.is_cancelled() {
                    return Err(PipelineError::Cancelled);
                }
                self.inner.submit(&records, cancel).await?;
                Ok(UpsertSummary {
                    records: len,
                    requests: 1,
                    workers: 1,
                })
            }
            BatchPlan::Concurrent {
                workers,
                sub_batch_size,
                sub_batches,
            } => {
                tracing::debug!(
                    index = %self.inner.name,
                    records = records.len(),
                    workers,
                    sub_batch_size,
                    sub_batches = sub_batches.len(),
                    "concurrent upsert"
                );
                let total = records.len();
                let records: Arc<[VectorRecord]> = records.into();
                let inner = Arc::clone(&self.inner);
                let worker_cancel = cancel.clone();

                let report = executor::execute(
                    sub_batches,
                    workers,
                    cancel,
                    move |_, range: Range<usize>| {
                        let inner = Arc::clone(&inner);
                        let records = Arc::clone(&records);
                        let cancel = worker_cancel.clone();
                        async move { inner.submit(&records[range], &cancel).await }
                    },
                )
                .await?;

                Ok(UpsertSummary {
                    records: total,
                    requests: report.total,
                    workers: report.workers,
                })
            }
        }
    }

    /// Runs a similarity search and returns hits in service order.
    pub async fn query(
        &self,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> PipelineResult<Vec<QueryOutcome>> {
        Ok(self.query_detailed(request, cancel).await?.outcomes)
    }

    /// Like [`query`](Self::query), also reporting how many malformed rows
    /// were skipped.
    pub async fn query_detailed(
        &self,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> PipelineResult<Assembly> {
        let inner = &self.inner;
        let body = request.to_body(inner.dimension, inner.space)?;
        let http = TransportRequest::post(format!("index/{}/search", inner.name)).with_json(&body)?;
        let response = inner.transport.send(http, cancel).await?.check()?;

        let rows = codec::decode_rows(&response.body).map_err(PipelineError::Decode)?;
        let include_vectors = request.include_vectors;
        tracing::debug!(index = %inner.name, rows = rows.len(), "query returned");

        if rows.len() <= inner.settings.decode_threshold {
            return assemble(&rows, include_vectors, &inner.settings, &inner.pools, cancel);
        }

        let inner = Arc::clone(&self.inner);
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || {
            assemble(&rows, include_vectors, &inner.settings, &inner.pools, &cancel)
        })
        .await
        .map_err(|err| PipelineError::Worker(err.to_string()))?
    }

    /// Fetches one stored record by id.
    pub async fn get_vector(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> PipelineResult<VectorRecord> {
        let inner = &self.inner;
        let http = TransportRequest::post(format!("index/{}/vector/get", inner.name))
            .with_json(&json!({ "id": id }))?;
        let response = inner.transport.send(http, cancel).await?.check()?;

        let fields = codec::decode_row(&response.body).map_err(PipelineError::Decode)?;
        let mut scratch = inner.pools.scratch.acquire();
        codec::decode_stored(&fields, &mut scratch).map_err(PipelineError::Decode)
    }

    /// Deletes one record. Returns the service's response text.
    ///
    /// Hybrid records are deleted the same way; the sparse part goes with
    /// the dense one. The id is percent-encoded as a single path segment.
    pub async fn delete_vector(&self, id: &str, cancel: &CancellationToken) -> PipelineResult<String> {
        let http = TransportRequest::delete(format!(
            "index/{}/vector/{}/delete",
            self.inner.name,
            urlencoding::encode(id)
        ));
        let response = self.inner.transport.send(http, cancel).await?.check()?;
        Ok(response.text())
    }

    /// Deletes every record matching `filter`, dense and hybrid alike.
    /// Returns the response text.
    pub async fn delete_by_filter(
        &self,
        filter: &Attributes,
        cancel: &CancellationToken,
    ) -> PipelineResult<String> {
        let http = TransportRequest::delete(format!("index/{}/vectors/delete", self.inner.name))
            .with_json(&json!({ "filter": [filter] }))?;
        let response = self.inner.transport.send(http, cancel).await?.check()?;
        Ok(response.text())
    }
}

impl Inner {
    fn encode(&self, records: &[VectorRecord]) -> PipelineResult<Bytes> {
        let mut scratch = self.pools.scratch.acquire();
        let mut payload = self.pools.payload.acquire();
        codec::encode_batch_into(records, self.dimension, self.space, &mut scratch, &mut payload)?;
        Ok(Bytes::copy_from_slice(&payload))
    }

    async fn submit(&self, records: &[VectorRecord], cancel: &CancellationToken) -> PipelineResult<()> {
        let body = self.encode(records)?;
        let http = TransportRequest::post(format!("index/{}/vector/insert", self.name))
            .with_body(body, codec::MSGPACK_CONTENT_TYPE);
        self.transport.send(http, cancel).await?.check()?;
        Ok(())
    }
}

/// Local checks run over the whole batch before anything is encoded or sent.
pub fn validate_batch(records: &[VectorRecord], dimension: usize) -> PipelineResult<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for (position, record) in records.iter().enumerate() {
        if record.id.trim().is_empty() {
            return Err(PipelineError::EmptyId { position });
        }
        if let Some(sparse) = &record.sparse {
            if !sparse.is_consistent() {
                return Err(PipelineError::SparseMismatch {
                    id: record.id.clone(),
                });
            }
        }
        if record.vector.len() != dimension {
            return Err(PipelineError::DimensionMismatch {
                id: record.id.clone(),
                expected: dimension,
                actual: record.vector.len(),
            });
        }
        if !seen.insert(record.id.as_str()) {
            return Err(PipelineError::DuplicateId {
                id: record.id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> VectorRecord {
        VectorRecord::new(id, vec![1.0, 0.0, 0.0])
    }

    #[test]
    fn valid_batch_passes() {
        let batch = vec![record("a"), record("b")];
        assert!(validate_batch(&batch, 3).is_ok());
        assert!(validate_batch(&[], 3).is_ok());
    }

    #[test]
    fn blank_ids_rejected() {
        let batch = vec![record("a"), record("   ")];
        let err = validate_batch(&batch, 3).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyId { position: 1 }));
    }

    #[test]
    fn sparse_mismatch_names_the_record() {
        let batch = vec![record("ok"), record("bad").with_sparse(vec![1, 2], vec![0.1])];
        let err = validate_batch(&batch, 3).unwrap_err();
        assert!(matches!(err, PipelineError::SparseMismatch { ref id } if id == "bad"));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn half_present_sparse_rejected() {
        let batch = vec![record("x").with_sparse(Vec::new(), vec![0.1])];
        assert!(matches!(
            validate_batch(&batch, 3),
            Err(PipelineError::SparseMismatch { .. })
        ));
    }

    #[test]
    fn dimension_checked_for_every_record() {
        let batch = vec![record("a"), VectorRecord::new("short", vec![1.0])];
        let err = validate_batch(&batch, 3).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DimensionMismatch { ref id, expected: 3, actual: 1 } if id == "short"
        ));
    }

    #[test]
    fn duplicates_rejected() {
        let batch = vec![record("a"), record("b"), record("a")];
        assert!(matches!(
            validate_batch(&batch, 3),
            Err(PipelineError::DuplicateId { ref id }) if id == "a"
        ));
    }
}
