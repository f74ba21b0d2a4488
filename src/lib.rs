//! Workspace umbrella crate for the Endee client.
//!
//! Re-exports the vector model, the submission/query pipeline and the HTTP
//! client so callers depend on a single crate.

pub use client::{
    ClientConfig, ClientError, ClientResult, CreateIndexOptions, Endee, HttpTransport, IndexInfo,
    parse_space_type, validate_index_name,
};
pub use pipeline::{
    ApiError, Assembly, CancellationToken, Index, IndexParams, MalformedPolicy, PipelineError,
    PipelineResult, PipelineSettings, QueryRequest, Transport, TransportRequest,
    TransportResponse, UpsertSummary,
};
pub use vector::{
    Attributes, Precision, QueryOutcome, SpaceType, SparseVector, VectorError, VectorRecord,
};

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to `default_filter`. With
/// `json` set, events are emitted as JSON lines.
pub fn init_tracing(default_filter: &str, json: bool) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| anyhow::anyhow!(err))
}
