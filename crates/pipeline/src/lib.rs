//! # Endee pipeline
//!
//! Client-side submission and result assembly for one remote index.
//!
//! ```text
//! records -> validate -> plan -> [normalize + encode + send] x sub-batches
//! query   -> validate -> send -> decode rows -> assemble (ordered)
//! ```
//!
//! Everything network-facing goes through the [`Transport`] trait, so the
//! pipeline can be driven by the reqwest client in `endee-client` or by an
//! in-memory fake in tests.
//!
//! - [`plan`] chooses sequential or concurrent submission.
//! - [`executor`] runs sub-batches on a bounded async worker pool.
//! - [`assemble`] decodes result rows on scoped threads, preserving order.
//! - [`pool`] hands out reusable scratch buffers.

pub mod assemble;
mod error;
pub mod executor;
mod index;
pub mod plan;
pub mod pool;
mod query;
mod settings;
pub mod transport;

pub use crate::assemble::Assembly;
pub use crate::error::{ApiError, PipelineError, PipelineResult};
pub use crate::index::{validate_batch, Index, IndexParams, UpsertSummary};
pub use crate::query::QueryRequest;
pub use crate::settings::{default_parallelism, MalformedPolicy, PipelineSettings};
pub use crate::transport::{Method, Transport, TransportRequest, TransportResponse};

pub use tokio_util::sync::CancellationToken;
