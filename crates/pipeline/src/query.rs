use serde::Serialize;
use std::borrow::Cow;
use vector::limits::{DEFAULT_EF_SEARCH, DEFAULT_TOP_K, MAX_EF_SEARCH, MAX_TOP_K};
use vector::{normalize, Attributes, SpaceType, SparseVector};

use crate::error::{PipelineError, PipelineResult};

/// A similarity search against one index.
///
/// At least one of the dense vector or the sparse pair must be set.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub vector: Option<Vec<f32>>,
    pub sparse: Option<SparseVector>,
    /// Number of neighbours to return, `1..=512`.
    pub top_k: usize,
    /// Search breadth, `0..=1024`.
    pub ef: usize,
    pub include_vectors: bool,
    pub filter: Option<Attributes>,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            vector: None,
            sparse: None,
            top_k: DEFAULT_TOP_K,
            ef: DEFAULT_EF_SEARCH,
            include_vectors: false,
            filter: None,
        }
    }
}

impl QueryRequest {
    pub fn dense(vector: Vec<f32>) -> Self {
        Self {
            vector: Some(vector),
            ..Default::default()
        }
    }

    pub fn sparse(indices: Vec<u32>, values: Vec<f32>) -> Self {
        Self {
            sparse: Some(SparseVector::new(indices, values)),
            ..Default::default()
        }
    }

    /// Adds a sparse component to a dense query.
    pub fn with_sparse(mut self, indices: Vec<u32>, values: Vec<f32>) -> Self {
        self.sparse = Some(SparseVector::new(indices, values));
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_ef(mut self, ef: usize) -> Self {
        self.ef = ef;
        self
    }

    pub fn with_vectors(mut self, include: bool) -> Self {
        self.include_vectors = include;
        self
    }

    pub fn with_filter(mut self, filter: Attributes) -> Self {
        self.filter = Some(filter);
        self
    }

    fn dense_part(&self) -> Option<&[f32]> {
        self.vector.as_deref().filter(|v| !v.is_empty())
    }

    fn sparse_part(&self) -> Option<&SparseVector> {
        self.sparse.as_ref().filter(|s| !s.indices.is_empty() || !s.values.is_empty())
    }

    /// Range and presence checks. Nothing is sent when this fails.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.top_k == 0 || self.top_k > MAX_TOP_K {
            return Err(PipelineError::InvalidTopK {
                k: self.top_k,
                max: MAX_TOP_K,
            });
        }
        if self.ef > MAX_EF_SEARCH {
            return Err(PipelineError::InvalidEf {
                ef: self.ef,
                max: MAX_EF_SEARCH,
            });
        }

        let sparse = self.sparse_part();
        if self.dense_part().is_none() && sparse.is_none() {
            return Err(PipelineError::MissingQueryVector);
        }
        if let Some(sparse) = sparse {
            if sparse.indices.is_empty() || !sparse.is_consistent() {
                return Err(PipelineError::QuerySparseMismatch);
            }
        }
        Ok(())
    }

    /// Validates and builds the JSON search body, normalizing the dense part
    /// for cosine indices.
    pub(crate) fn to_body(
        &self,
        dimension: usize,
        space: SpaceType,
    ) -> PipelineResult<SearchBody<'_>> {
        self.validate()?;

        let vector = match self.dense_part() {
            Some(dense) => Some(normalize(dense, dimension, space).map_err(|err| match err {
                vector::VectorError::DimensionMismatch { expected, actual } => {
                    PipelineError::DimensionMismatch {
                        id: "<query>".to_string(),
                        expected,
                        actual,
                    }
                }
                other => PipelineError::Encode(other),
            })?),
            None => None,
        };

        let filter = match &self.filter {
            Some(filter) => Some(serde_json::to_string(&[filter]).map_err(|err| {
                PipelineError::Encode(vector::VectorError::from(err))
            })?),
            None => None,
        };

        let sparse = self.sparse_part();
        Ok(SearchBody {
            vector: vector.map(|n| n.vector),
            sparse_indices: sparse.map(|s| s.indices.as_slice()),
            sparse_values: sparse.map(|s| s.values.as_slice()),
            k: self.top_k,
            ef: self.ef,
            include_vectors: self.include_vectors,
            filter,
        })
    }
}

/// JSON body of `POST index/{name}/search`.
#[derive(Debug, Serialize)]
pub(crate) struct SearchBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Cow<'a, [f32]>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sparse_indices: Option<&'a [u32]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sparse_values: Option<&'a [f32]>,
    pub k: usize,
    pub ef: usize,
    pub include_vectors: bool,
    /// JSON text of a one-element array holding the filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}
