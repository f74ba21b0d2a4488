use serde::{Deserialize, Serialize};
use serde_json::Value;
use vector::limits::{CREATE_CHECKSUM, DEFAULT_EF_CONSTRUCTION, DEFAULT_M, DEFAULT_SPARSE_DIMENSION};
use vector::{Precision, SpaceType};

/// Tuning knobs for a new index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIndexOptions {
    /// HNSW graph degree.
    pub m: u32,
    /// HNSW construction breadth.
    pub ef_construction: u32,
    /// Store vectors as fp16 instead of int8.
    pub use_fp16: bool,
    /// Width of the sparse component; 0 means dense-only.
    pub sparse_dimension: usize,
    pub version: Option<u32>,
}

impl Default for CreateIndexOptions {
    fn default() -> Self {
        Self {
            m: DEFAULT_M,
            ef_construction: DEFAULT_EF_CONSTRUCTION,
            use_fp16: false,
            sparse_dimension: DEFAULT_SPARSE_DIMENSION,
            version: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateIndexBody<'a> {
    pub index_name: &'a str,
    pub dim: usize,
    pub space_type: SpaceType,
    #[serde(rename = "M")]
    pub m: u32,
    pub ef_con: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub sparse_dim: usize,
    pub checksum: i64,
    pub use_int8d: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl<'a> CreateIndexBody<'a> {
    pub fn new(name: &'a str, dimension: usize, space: SpaceType, options: &CreateIndexOptions) -> Self {
        Self {
            index_name: name,
            dim: dimension,
            space_type: space,
            m: options.m,
            ef_con: options.ef_construction,
            sparse_dim: options.sparse_dimension,
            checksum: CREATE_CHECKSUM,
            use_int8d: !options.use_fp16,
            version: options.version,
        }
    }
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

/// `GET index/list` payload. The service spells the key `indixes`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListIndexesResponse {
    #[serde(default, alias = "indexes")]
    pub indixes: Option<Vec<Value>>,
}

/// `GET index/{name}/info` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lib_token: String,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub space_type: String,
    pub dimension: usize,
    #[serde(default)]
    pub sparse_dim: usize,
    #[serde(default)]
    pub use_fp16: bool,
    #[serde(rename = "M", default)]
    pub m: u32,
    #[serde(default)]
    pub checksum: i64,
    #[serde(default)]
    pub created_at: i64,
}

impl IndexInfo {
    pub fn precision(&self) -> Precision {
        if self.use_fp16 {
            Precision::Float16
        } else {
            Precision::Int8d
        }
    }
}
