//! Service-side limits and HNSW defaults shared by every client component.

/// Largest dense dimension an index may declare.
pub const MAX_DIMENSION: usize = 10_000;
/// Largest number of records accepted by a single upsert call.
pub const MAX_VECTORS_PER_BATCH: usize = 1_000;
/// Largest `k` a query may request.
pub const MAX_TOP_K: usize = 512;
/// Largest `ef` a query may request.
pub const MAX_EF_SEARCH: usize = 1_024;
/// Index names must be strictly shorter than this.
pub const MAX_INDEX_NAME_LEN: usize = 48;

/// Bi-directional links per HNSW node.
pub const DEFAULT_M: u32 = 16;
/// Candidate list size while building the graph.
pub const DEFAULT_EF_CONSTRUCTION: u32 = 128;
/// Dense-only indices carry no sparse component.
pub const DEFAULT_SPARSE_DIMENSION: usize = 0;
pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_EF_SEARCH: usize = 128;

/// Checksum sent with every create-index request.
pub const CREATE_CHECKSUM: i64 = -1;

/// Minimum positional fields in a query result tuple.
pub const RESULT_TUPLE_MIN_FIELDS: usize = 5;
