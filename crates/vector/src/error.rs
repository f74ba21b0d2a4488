use std::io;
use thiserror::Error;

/// Errors raised while normalizing, encoding, or decoding vectors.
#[derive(Debug, Error)]
pub enum VectorError {
    /// The vector length does not match the index dimension.
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// JSON or msgpack encoding failed.
    #[error("serialization failed: {0}")]
    Serialization(String),
    /// zlib compression or decompression failed.
    #[error("compression failed: {0}")]
    Compression(#[from] io::Error),
    /// A wire tuple carried fewer positional fields than required.
    #[error("invalid result format: expected at least {expected} elements, got {actual}")]
    MalformedTuple { expected: usize, actual: usize },
    /// The msgpack payload did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for VectorError {
    fn from(err: serde_json::Error) -> Self {
        VectorError::Serialization(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for VectorError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        VectorError::Serialization(err.to_string())
    }
}

impl From<rmpv::decode::Error> for VectorError {
    fn from(err: rmpv::decode::Error) -> Self {
        VectorError::Decode(err.to_string())
    }
}
