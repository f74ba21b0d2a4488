use pipeline::{ApiError, PipelineError};
use thiserror::Error;
use vector::limits::{MAX_DIMENSION, MAX_INDEX_NAME_LEN};

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(
        "invalid index name {0:?}: must be alphanumeric or underscores and shorter than {max} characters",
        max = MAX_INDEX_NAME_LEN
    )]
    InvalidIndexName(String),

    #[error("dimension cannot be greater than {max} (got {0})", max = MAX_DIMENSION)]
    DimensionTooLarge(usize),

    #[error("invalid space type: {0}")]
    InvalidSpaceType(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("failed to decode response: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ApiError> for ClientError {
    fn from(err: ApiError) -> Self {
        ClientError::Pipeline(PipelineError::Api(err))
    }
}

impl ClientError {
    /// The classified service error behind this failure, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ClientError::Pipeline(err) => err.api_error(),
            _ => None,
        }
    }
}
