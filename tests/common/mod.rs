//! Shared fixtures: an in-memory transport and record builders.

#![allow(dead_code)]

use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use endee::{
    CancellationToken, Index, IndexParams, PipelineError, PipelineResult, PipelineSettings,
    SpaceType, Transport, TransportRequest, TransportResponse, VectorRecord,
};
use parking_lot::Mutex;
use rmpv::Value;

type Responder = dyn Fn(&TransportRequest, usize) -> PipelineResult<TransportResponse> + Send + Sync;

/// Records every request and answers through a scripted responder.
pub struct MockTransport {
    responder: Box<Responder>,
    jitter_ms: Option<Range<u64>>,
    calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&TransportRequest, usize) -> PipelineResult<TransportResponse> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            jitter_ms: None,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers every request with `200` and an empty body.
    pub fn ok() -> Self {
        Self::new(|_, _| Ok(TransportResponse::new(200, Bytes::new())))
    }

    /// Answers every request with `status` and `body`.
    pub fn fixed(status: u16, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self::new(move |_, _| Ok(TransportResponse::new(status, body.clone())))
    }

    /// Sleeps a random number of milliseconds in `range` before answering.
    pub fn with_jitter(mut self, range: Range<u64>) -> Self {
        self.jitter_ms = Some(range);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> TransportRequest {
        self.requests
            .lock()
            .last()
            .cloned()
            .expect("no request recorded")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        request: TransportRequest,
        cancel: &CancellationToken,
    ) -> PipelineResult<TransportResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .jitter_ms
            .clone()
            .map(|range| Duration::from_millis(fastrand::u64(range)))
            .unwrap_or_default();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            _ = tokio::time::sleep(delay) => (self.responder)(&request, call),
        };
        self.active.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

pub fn settings(parallelism: usize) -> PipelineSettings {
    PipelineSettings::default().with_parallelism(parallelism)
}

pub fn index_with(
    transport: Arc<MockTransport>,
    dimension: usize,
    space: SpaceType,
    settings: PipelineSettings,
) -> Index {
    Index::new(IndexParams::new("test_index", dimension, space), transport, settings)
}

/// `count` records with ids `vec-0..`, each a distinct non-zero vector.
pub fn records(count: usize, dimension: usize) -> Vec<VectorRecord> {
    (0..count)
        .map(|i| {
            let vector = (0..dimension).map(|d| (i + d + 1) as f32).collect();
            VectorRecord::new(format!("vec-{i}"), vector)
        })
        .collect()
}

/// Top-level rows of an upsert or query body.
pub fn body_rows(request: &TransportRequest) -> Vec<Vec<Value>> {
    let body = request.body.as_ref().expect("request has no body");
    vector::codec::decode_rows(body).expect("body is not msgpack rows")
}

/// Ids carried by an upsert body, in order.
pub fn body_ids(request: &TransportRequest) -> Vec<String> {
    body_rows(request)
        .iter()
        .map(|row| row[0].as_str().unwrap_or_default().to_string())
        .collect()
}

/// A query result row: `[similarity, id, meta, filter, norm, vector]`.
pub fn result_row(position: usize, dimension: usize) -> Value {
    Value::Array(vec![
        Value::F32(1.0 - position as f32 * 0.001),
        Value::from(format!("hit-{position}")),
        Value::Binary(Vec::new()),
        Value::from(r#"{"rank":1}"#),
        Value::F32(1.0),
        Value::Array((0..dimension).map(|_| Value::F32(0.5)).collect()),
    ])
}

pub fn msgpack(value: &Value) -> Bytes {
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, value).expect("encode msgpack");
    Bytes::from(buf)
}

/// Response body carrying `count` well-formed result rows.
pub fn result_body(count: usize, dimension: usize) -> Bytes {
    msgpack(&Value::Array(
        (0..count).map(|i| result_row(i, dimension)).collect(),
    ))
}
