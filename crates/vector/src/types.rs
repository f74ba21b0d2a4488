use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// String-keyed JSON mapping used for both metadata and filter attributes.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Distance metric an index was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceType {
    /// Cosine similarity. Vectors are L2-normalized before upload.
    #[default]
    Cosine,
    /// Euclidean distance.
    L2,
    /// Inner product.
    Ip,
}

impl SpaceType {
    pub const fn as_str(self) -> &'static str {
        match self {
            SpaceType::Cosine => "cosine",
            SpaceType::L2 => "l2",
            SpaceType::Ip => "ip",
        }
    }

    pub const fn is_cosine(self) -> bool {
        matches!(self, SpaceType::Cosine)
    }
}

impl fmt::Display for SpaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpaceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(SpaceType::Cosine),
            "l2" => Ok(SpaceType::L2),
            "ip" => Ok(SpaceType::Ip),
            other => Err(format!("invalid space type: {other}")),
        }
    }
}

/// Storage precision of an index (quantization level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Binary,
    Float16,
    Float32,
    Int16d,
    #[default]
    Int8d,
}

impl Precision {
    pub const ALL: [Precision; 5] = [
        Precision::Binary,
        Precision::Float16,
        Precision::Float32,
        Precision::Int16d,
        Precision::Int8d,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Precision::Binary => "binary",
            Precision::Float16 => "float16",
            Precision::Float32 => "float32",
            Precision::Int16d => "int16d",
            Precision::Int8d => "int8d",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parallel index/value arrays for the non-zero positions of a sparse vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn new(indices: Vec<u32>, values: Vec<f32>) -> Self {
        Self { indices, values }
    }

    /// Both halves empty means "no sparse component".
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty() && self.values.is_empty()
    }

    /// Present and equally sized.
    pub fn is_consistent(&self) -> bool {
        self.indices.len() == self.values.len()
    }
}

/// A vector handed to the upsert pipeline, or read back by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique identifier within the index.
    pub id: String,
    /// Dense components; length must equal the index dimension.
    pub vector: Vec<f32>,
    /// Optional sparse component for hybrid indices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparse: Option<SparseVector>,
    /// Opaque metadata, stored zlib-compressed.
    #[serde(default)]
    pub metadata: Attributes,
    /// Attributes the service can filter on.
    #[serde(default)]
    pub filter: Attributes,
}

impl VectorRecord {
    pub fn new(id: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
            ..Default::default()
        }
    }

    pub fn with_sparse(mut self, indices: Vec<u32>, values: Vec<f32>) -> Self {
        self.sparse = Some(SparseVector::new(indices, values));
        self
    }

    pub fn with_metadata(mut self, metadata: Attributes) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_filter(mut self, filter: Attributes) -> Self {
        self.filter = filter;
        self
    }

    /// Sparse component if it carries any data.
    pub fn sparse_part(&self) -> Option<&SparseVector> {
        self.sparse.as_ref().filter(|sparse| !sparse.is_empty())
    }
}

/// One decoded hit from a query response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub id: String,
    pub similarity: f32,
    /// Always `1 - similarity`.
    pub distance: f32,
    /// `None` when the wire blob was empty or could not be decoded.
    pub metadata: Option<Attributes>,
    /// `None` when the wire string was empty or not a JSON object.
    pub filter: Option<Attributes>,
    pub norm: f32,
    /// Only populated when the query asked for vectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_type_parses_case_insensitively() {
        assert_eq!("COSINE".parse::<SpaceType>().unwrap(), SpaceType::Cosine);
        assert_eq!("l2".parse::<SpaceType>().unwrap(), SpaceType::L2);
        assert_eq!("Ip".parse::<SpaceType>().unwrap(), SpaceType::Ip);
        assert!("manhattan".parse::<SpaceType>().is_err());
    }

    #[test]
    fn space_type_serializes_lowercase() {
        let json = serde_json::to_string(&SpaceType::Cosine).unwrap();
        assert_eq!(json, "\"cosine\"");
    }

    #[test]
    fn precision_names_match_service() {
        let names: Vec<&str> = Precision::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(names, ["binary", "float16", "float32", "int16d", "int8d"]);
        assert_eq!(Precision::default(), Precision::Int8d);
    }

    #[test]
    fn empty_sparse_counts_as_absent() {
        let record = VectorRecord::new("a", vec![1.0]).with_sparse(vec![], vec![]);
        assert!(record.sparse_part().is_none());

        let record = VectorRecord::new("b", vec![1.0]).with_sparse(vec![3], vec![0.5]);
        assert!(record.sparse_part().is_some());
    }

    #[test]
    fn sparse_consistency() {
        assert!(SparseVector::new(vec![1, 2], vec![0.1, 0.2]).is_consistent());
        assert!(!SparseVector::new(vec![1, 2], vec![0.1]).is_consistent());
    }
}
