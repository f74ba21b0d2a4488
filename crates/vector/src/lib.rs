//! # Endee vector model
//!
//! Records, normalization, and the msgpack wire codec shared by the upsert
//! and query pipelines.
//!
//! - [`normalize`] checks dimensionality and scales cosine-space vectors to
//!   unit length, reporting the original norm.
//! - [`codec`] turns records into positional wire tuples and decodes query
//!   results back into [`QueryOutcome`]s.
//! - [`compression`] wraps metadata as zlib-compressed JSON.
//! - [`coerce`] is the single place loosely typed msgpack numbers become `f32`.
//!
//! ```
//! use vector::{codec, SpaceType, VectorRecord};
//!
//! let record = VectorRecord::new("doc-1", vec![3.0, 4.0]);
//! let body = codec::encode_batch(&[record], 2, SpaceType::Cosine).unwrap();
//! let rows = codec::decode_rows(&body).unwrap();
//! assert_eq!(rows.len(), 1);
//! ```

pub mod codec;
pub mod coerce;
pub mod compression;
pub mod error;
pub mod limits;
mod normalize;
mod types;

pub use crate::codec::{WireTuple, MSGPACK_CONTENT_TYPE};
pub use crate::error::VectorError;
pub use crate::normalize::{l2_norm, normalize, Normalized};
pub use crate::types::{
    Attributes, Precision, QueryOutcome, SpaceType, SparseVector, VectorRecord,
};
