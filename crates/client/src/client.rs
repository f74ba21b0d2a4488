use pipeline::{CancellationToken, Index, IndexParams, Transport, TransportRequest};
use serde_json::Value;
use std::sync::Arc;
use vector::limits::{MAX_DIMENSION, MAX_INDEX_NAME_LEN};
use vector::SpaceType;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::HttpTransport;
use crate::models::{CreateIndexBody, CreateIndexOptions, IndexInfo, ListIndexesResponse};

/// Entry point: manages indices and hands out [`Index`] handles.
///
/// # Example
/// ```no_run
/// use client::{ClientConfig, Endee};
///
/// # async fn run() -> Result<(), client::ClientError> {
/// let endee = Endee::new(ClientConfig::default().with_token("my-token"))?;
/// for index in endee.list_indexes().await? {
///     println!("{index}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Endee {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Endee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endee")
            .field("base_url", &self.config.base_url)
            .field("authenticated", &self.config.token.is_some())
            .finish_non_exhaustive()
    }
}

impl Endee {
    /// Builds a client backed by [`HttpTransport`].
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Builds a client from `endee.*` and `ENDEE__*` settings.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::load()?)
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Creates an index and returns the service's response text.
    pub async fn create_index(
        &self,
        name: &str,
        dimension: usize,
        space: SpaceType,
        options: &CreateIndexOptions,
    ) -> ClientResult<String> {
        validate_index_name(name)?;
        if dimension > MAX_DIMENSION {
            return Err(ClientError::DimensionTooLarge(dimension));
        }

        let body = CreateIndexBody::new(name, dimension, space, options);
        let request = TransportRequest::post("index/create").with_json(&body)?;
        let response = self.send(request).await?;
        tracing::info!(index = name, dimension, %space, "index created");
        Ok(response.text())
    }

    /// Names (or descriptors) of every index visible to the token.
    pub async fn list_indexes(&self) -> ClientResult<Vec<Value>> {
        let response = self.send(TransportRequest::get("index/list")).await?;
        let parsed: ListIndexesResponse = serde_json::from_slice(&response.body)?;
        Ok(parsed.indixes.unwrap_or_default())
    }

    pub async fn delete_index(&self, name: &str) -> ClientResult<String> {
        let response = self
            .send(TransportRequest::delete(format!("index/{name}/delete")))
            .await?;
        tracing::info!(index = name, "index deleted");
        Ok(response.text())
    }

    pub async fn index_info(&self, name: &str) -> ClientResult<IndexInfo> {
        let response = self
            .send(TransportRequest::get(format!("index/{name}/info")))
            .await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Looks the index up and returns a handle configured from its info.
    pub async fn get_index(&self, name: &str) -> ClientResult<Index> {
        let info = self.index_info(name).await?;
        let space = parse_space_type(&info.space_type)?;
        let params = IndexParams {
            name: name.to_string(),
            dimension: info.dimension,
            space,
            sparse_dimension: info.sparse_dim,
            precision: info.precision(),
        };
        Ok(self.index(params))
    }

    /// Handle for an index whose shape is already known, without a round trip.
    pub fn index(&self, params: IndexParams) -> Index {
        Index::new(params, Arc::clone(&self.transport), self.config.pipeline_settings())
    }

    async fn send(&self, request: TransportRequest) -> ClientResult<pipeline::TransportResponse> {
        let cancel = CancellationToken::new();
        Ok(self.transport.send(request, &cancel).await?.check()?)
    }
}

/// Non-empty, shorter than 48 characters, ASCII alphanumerics and `_` only.
pub fn validate_index_name(name: &str) -> ClientResult<()> {
    let valid = !name.is_empty()
        && name.len() < MAX_INDEX_NAME_LEN
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(ClientError::InvalidIndexName(name.to_string()))
    }
}

pub fn parse_space_type(text: &str) -> ClientResult<SpaceType> {
    text.parse::<SpaceType>()
        .map_err(|_| ClientError::InvalidSpaceType(text.to_string()))
}
