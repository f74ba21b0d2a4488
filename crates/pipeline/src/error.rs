use serde_json::Value;
use thiserror::Error;
use vector::VectorError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Classified non-200 response from the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Endee API Error 400: {0}")]
    BadRequest(String),

    #[error("Authentication Error: {0}")]
    Authentication(String),

    #[error("Subscription Error: {0}")]
    Subscription(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server Busy: Server is busy. Please try again in sometime")]
    ServerBusy { status: u16 },

    #[error("Endee API Error {status}: {message}")]
    Other { status: u16, message: String },
}

impl ApiError {
    /// Maps a status code and raw body to an error kind.
    ///
    /// The message is taken from a JSON `{"error": "..."}` body when present,
    /// otherwise the body text is used as-is.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let message = error_message(body);
        match status {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Authentication(message),
            402 => ApiError::Subscription(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            500..=599 => ApiError::ServerBusy { status },
            _ => ApiError::Other { status, message },
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Authentication(_) => 401,
            ApiError::Subscription(_) => 402,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::ServerBusy { status } | ApiError::Other { status, .. } => *status,
        }
    }
}

fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("error") {
            Some(Value::String(msg)) => msg.clone(),
            _ => String::from_utf8_lossy(body).into_owned(),
        },
        Ok(_) => String::from_utf8_lossy(body).into_owned(),
        Err(_) if body.is_empty() => "Unknown error".to_string(),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

/// Everything that can go wrong between the caller and the service.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("id must not be empty (item index {position})")]
    EmptyId { position: usize },

    #[error("duplicate id in batch: {id}")]
    DuplicateId { id: String },

    #[error("sparse_indices and sparse_values must have the same length (item id: {id})")]
    SparseMismatch { id: String },

    #[error("vector dimension mismatch (item id: {id}): expected {expected}, got {actual}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("cannot insert more than {max} vectors at a time (got {len})")]
    BatchTooLarge { len: usize, max: usize },

    #[error("top_k must be between 1 and {max} (got {k})")]
    InvalidTopK { k: usize, max: usize },

    #[error("ef must be between 0 and {max} (got {ef})")]
    InvalidEf { ef: usize, max: usize },

    #[error("at least one of vector (dense) or sparse_indices/sparse_values must be provided")]
    MissingQueryVector,

    #[error("sparse_indices and sparse_values must both be provided with the same length")]
    QuerySparseMismatch,

    #[error("failed to encode request: {0}")]
    Encode(#[from] VectorError),

    #[error("{0}")]
    Decode(#[source] VectorError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to execute request: {0}")]
    Transport(String),

    #[error("invalid result format at position {position}: expected at least 5 elements, got {fields}")]
    MalformedResult { position: usize, fields: usize },

    #[error("operation cancelled")]
    Cancelled,

    #[error("worker task failed: {0}")]
    Worker(String),

    #[error("upsert failed: {source} (sub-batch {index}; {failed} of {total} sub-batches failed)")]
    SubBatch {
        index: usize,
        failed: usize,
        total: usize,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// True for errors detected locally before anything was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PipelineError::EmptyId { .. }
                | PipelineError::DuplicateId { .. }
                | PipelineError::SparseMismatch { .. }
                | PipelineError::DimensionMismatch { .. }
                | PipelineError::BatchTooLarge { .. }
                | PipelineError::InvalidTopK { .. }
                | PipelineError::InvalidEf { .. }
                | PipelineError::MissingQueryVector
                | PipelineError::QuerySparseMismatch
        )
    }

    /// The classified service error, looking through sub-batch aggregation.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            PipelineError::Api(err) => Some(err),
            PipelineError::SubBatch { source, .. } => source.api_error(),
            _ => None,
        }
    }
}
