//! Positional msgpack encoding of records and query results.
//!
//! Upserts travel as an array of tuples:
//!
//! ```text
//! [id, zlib(json(metadata)), json(filter), norm, [f32; dim], (sparse_indices, sparse_values)?]
//! ```
//!
//! Query results come back as:
//!
//! ```text
//! [similarity, id, metadata_blob, filter_json, norm, vector?]
//! ```
//!
//! Both ends share the layout out of band, so tuples carry no field names.

use rmpv::Value;
use serde::ser::{SerializeTuple, Serializer};
use serde::Serialize;
use std::borrow::Cow;

use crate::coerce::{to_bytes, to_f32, to_f32_vec, to_text, to_u32_vec};
use crate::compression::{json_unzip, json_zip};
use crate::limits::RESULT_TUPLE_MIN_FIELDS;
use crate::normalize::normalize;
use crate::{Attributes, QueryOutcome, SpaceType, SparseVector, VectorError, VectorRecord};

/// Content type of every msgpack body.
pub const MSGPACK_CONTENT_TYPE: &str = "application/msgpack";

/// One record ready for the wire. Serializes as a 5- or 7-element array.
#[derive(Debug, Clone, PartialEq)]
pub struct WireTuple<'a> {
    pub id: &'a str,
    pub metadata: Vec<u8>,
    pub filter: String,
    pub norm: f32,
    pub vector: Cow<'a, [f32]>,
    pub sparse: Option<&'a SparseVector>,
}

struct Bin<'a>(&'a [u8]);

impl Serialize for Bin<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0)
    }
}

impl Serialize for WireTuple<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.sparse.is_some() { 7 } else { 5 };
        let mut tuple = serializer.serialize_tuple(len)?;
        tuple.serialize_element(self.id)?;
        tuple.serialize_element(&Bin(&self.metadata))?;
        tuple.serialize_element(&self.filter)?;
        tuple.serialize_element(&self.norm)?;
        tuple.serialize_element(self.vector.as_ref())?;
        if let Some(sparse) = self.sparse {
            tuple.serialize_element(&sparse.indices)?;
            tuple.serialize_element(&sparse.values)?;
        }
        tuple.end()
    }
}

/// Normalizes `record` and builds its wire tuple.
///
/// `scratch` is reused for the intermediate metadata JSON.
pub fn encode_record<'a>(
    record: &'a VectorRecord,
    dimension: usize,
    space: SpaceType,
    scratch: &mut Vec<u8>,
) -> Result<WireTuple<'a>, VectorError> {
    let normalized = normalize(&record.vector, dimension, space)?;
    let metadata = json_zip(&record.metadata, scratch)?;
    let filter = serde_json::to_string(&record.filter)?;

    Ok(WireTuple {
        id: &record.id,
        metadata,
        filter,
        norm: normalized.norm,
        vector: normalized.vector,
        sparse: record.sparse_part(),
    })
}

/// Encodes a whole batch into `out`. On error `out` is left empty so no
/// partial payload can escape.
pub fn encode_batch_into(
    records: &[VectorRecord],
    dimension: usize,
    space: SpaceType,
    scratch: &mut Vec<u8>,
    out: &mut Vec<u8>,
) -> Result<(), VectorError> {
    out.clear();
    let tuples = records
        .iter()
        .map(|record| encode_record(record, dimension, space, scratch))
        .collect::<Result<Vec<_>, _>>()?;

    if let Err(err) = rmp_serde::encode::write(out, &tuples) {
        out.clear();
        return Err(err.into());
    }
    Ok(())
}

/// Convenience wrapper around [`encode_batch_into`] with fresh buffers.
pub fn encode_batch(
    records: &[VectorRecord],
    dimension: usize,
    space: SpaceType,
) -> Result<Vec<u8>, VectorError> {
    let mut scratch = Vec::new();
    let mut out = Vec::new();
    encode_batch_into(records, dimension, space, &mut scratch, &mut out)?;
    Ok(out)
}

/// Parses a response body into its positional rows.
///
/// The body must be a msgpack array. Entries that are not arrays become empty
/// rows so the caller's malformed-entry policy sees them.
pub fn decode_rows(body: &[u8]) -> Result<Vec<Vec<Value>>, VectorError> {
    let mut reader = body;
    match rmpv::decode::read_value(&mut reader)? {
        Value::Array(rows) => Ok(rows
            .into_iter()
            .map(|row| match row {
                Value::Array(fields) => fields,
                _ => Vec::new(),
            })
            .collect()),
        Value::Nil => Ok(Vec::new()),
        other => Err(VectorError::Decode(format!(
            "expected an array of results, got {other}"
        ))),
    }
}

/// Parses a body holding a single positional row, as returned by get-by-id.
pub fn decode_row(body: &[u8]) -> Result<Vec<Value>, VectorError> {
    let mut reader = body;
    match rmpv::decode::read_value(&mut reader)? {
        Value::Array(fields) => Ok(fields),
        other => Err(VectorError::Decode(format!("expected a result row, got {other}"))),
    }
}

/// Decodes one `[similarity, id, meta, filter, norm, vector?]` row.
///
/// Metadata and filter decode failures are tolerated: the field is left
/// `None` and the row still decodes.
pub fn decode_outcome(
    fields: &[Value],
    include_vectors: bool,
    scratch: &mut Vec<u8>,
) -> Result<QueryOutcome, VectorError> {
    if fields.len() < RESULT_TUPLE_MIN_FIELDS {
        return Err(VectorError::MalformedTuple {
            expected: RESULT_TUPLE_MIN_FIELDS,
            actual: fields.len(),
        });
    }

    let similarity = to_f32(&fields[0]);
    let vector = if include_vectors {
        fields.get(5).and_then(to_f32_vec).filter(|v| !v.is_empty())
    } else {
        None
    };

    Ok(QueryOutcome {
        id: to_text(&fields[1]),
        similarity,
        distance: 1.0 - similarity,
        metadata: decode_metadata(to_bytes(&fields[2]), scratch),
        filter: decode_filter(&to_text(&fields[3])),
        norm: to_f32(&fields[4]),
        vector,
    })
}

/// Decodes a stored `[id, meta, filter, norm, vector, indices?, values?]` row
/// as returned by a get-by-id call.
pub fn decode_stored(fields: &[Value], scratch: &mut Vec<u8>) -> Result<VectorRecord, VectorError> {
    if fields.len() < RESULT_TUPLE_MIN_FIELDS {
        return Err(VectorError::MalformedTuple {
            expected: RESULT_TUPLE_MIN_FIELDS,
            actual: fields.len(),
        });
    }

    let sparse = if fields.len() >= 7 {
        match (to_u32_vec(&fields[5]), to_f32_vec(&fields[6])) {
            (Some(indices), Some(values)) => Some(SparseVector::new(indices, values)),
            _ => None,
        }
    } else {
        None
    };

    Ok(VectorRecord {
        id: to_text(&fields[0]),
        vector: to_f32_vec(&fields[4]).unwrap_or_default(),
        sparse,
        metadata: decode_metadata(to_bytes(&fields[1]), scratch).unwrap_or_default(),
        filter: decode_filter(&to_text(&fields[2])).unwrap_or_default(),
    })
}

fn decode_metadata(bytes: &[u8], scratch: &mut Vec<u8>) -> Option<Attributes> {
    if bytes.is_empty() {
        return None;
    }
    match json_unzip(bytes, scratch) {
        Ok(meta) => Some(meta),
        Err(err) => {
            tracing::debug!(error = %err, "discarding undecodable metadata");
            None
        }
    }
}

fn decode_filter(text: &str) -> Option<Attributes> {
    if text.is_empty() {
        return None;
    }
    serde_json::from_str::<Attributes>(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: serde_json::Value) -> Attributes {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn encode_value(value: &Value) -> Vec<u8> {
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, value).unwrap();
        buf
    }

    #[test]
    fn dense_record_encodes_five_fields() {
        let record = VectorRecord::new("a", vec![3.0, 4.0])
            .with_metadata(attrs(json!({"title": "t"})))
            .with_filter(attrs(json!({"lang": "en"})));
        let body = encode_batch(&[record], 2, SpaceType::Cosine).unwrap();

        let rows = decode_rows(&body).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.len(), 5);
        assert_eq!(row[0].as_str(), Some("a"));
        assert!(matches!(row[1], Value::Binary(_)));
        assert_eq!(row[2].as_str(), Some(r#"{"lang":"en"}"#));
        assert_eq!(to_f32(&row[3]), 5.0);
        assert_eq!(to_f32_vec(&row[4]).unwrap(), vec![0.6, 0.8]);
    }

    #[test]
    fn sparse_record_encodes_seven_fields() {
        let record = VectorRecord::new("s", vec![1.0, 0.0]).with_sparse(vec![4, 9], vec![0.5, 0.25]);
        let body = encode_batch(&[record], 2, SpaceType::L2).unwrap();
        let rows = decode_rows(&body).unwrap();
        assert_eq!(rows[0].len(), 7);
        assert_eq!(to_u32_vec(&rows[0][5]).unwrap(), vec![4, 9]);
        assert_eq!(to_f32_vec(&rows[0][6]).unwrap(), vec![0.5, 0.25]);
    }

    #[test]
    fn empty_metadata_is_empty_bin_and_empty_filter_is_braces() {
        let record = VectorRecord::new("e", vec![1.0]);
        let body = encode_batch(&[record], 1, SpaceType::Cosine).unwrap();
        let rows = decode_rows(&body).unwrap();
        assert_eq!(rows[0][1], Value::Binary(Vec::new()));
        assert_eq!(rows[0][2].as_str(), Some("{}"));
    }

    #[test]
    fn dimension_mismatch_produces_no_payload() {
        let records = vec![
            VectorRecord::new("ok", vec![1.0, 0.0]),
            VectorRecord::new("bad", vec![1.0]),
        ];
        let mut scratch = Vec::new();
        let mut out = b"previous".to_vec();
        let err = encode_batch_into(&records, 2, SpaceType::Cosine, &mut scratch, &mut out).unwrap_err();
        assert!(matches!(err, VectorError::DimensionMismatch { .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn outcome_decodes_all_fields() {
        let mut scratch = Vec::new();
        let meta = json_zip(&attrs(json!({"k": 1})), &mut scratch).unwrap();
        let row = vec![
            Value::F32(0.75),
            Value::from("doc-1"),
            Value::Binary(meta),
            Value::from(r#"{"lang":"en"}"#),
            Value::F64(2.0),
            Value::Array(vec![Value::F32(0.5), Value::from(1)]),
        ];

        let outcome = decode_outcome(&row, true, &mut scratch).unwrap();
        assert_eq!(outcome.id, "doc-1");
        assert_eq!(outcome.similarity, 0.75);
        assert!((outcome.distance - 0.25).abs() < 1e-6);
        assert_eq!(outcome.metadata, Some(attrs(json!({"k": 1}))));
        assert_eq!(outcome.filter, Some(attrs(json!({"lang": "en"}))));
        assert_eq!(outcome.norm, 2.0);
        assert_eq!(outcome.vector, Some(vec![0.5, 1.0]));
    }

    #[test]
    fn vector_is_dropped_unless_requested() {
        let row = vec![
            Value::F32(0.9),
            Value::from("x"),
            Value::Nil,
            Value::from(""),
            Value::F32(1.0),
            Value::Array(vec![Value::F32(1.0)]),
        ];
        let outcome = decode_outcome(&row, false, &mut Vec::new()).unwrap();
        assert!(outcome.vector.is_none());
        assert!(outcome.metadata.is_none());
        assert!(outcome.filter.is_none());
    }

    #[test]
    fn bad_metadata_and_filter_are_not_fatal() {
        let row = vec![
            Value::from(1),
            Value::from("x"),
            Value::Binary(b"garbage".to_vec()),
            Value::from("{not json"),
            Value::from(1),
        ];
        let outcome = decode_outcome(&row, true, &mut Vec::new()).unwrap();
        assert!(outcome.metadata.is_none());
        assert!(outcome.filter.is_none());
        assert_eq!(outcome.similarity, 1.0);
        assert_eq!(outcome.distance, 0.0);
    }

    #[test]
    fn short_rows_are_malformed() {
        let row = vec![Value::F32(0.5), Value::from("x")];
        let err = decode_outcome(&row, false, &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            VectorError::MalformedTuple {
                expected: 5,
                actual: 2
            }
        ));
    }

    #[test]
    fn rows_accept_non_array_entries_as_empty() {
        let body = encode_value(&Value::Array(vec![
            Value::from(3),
            Value::Array(vec![Value::from(1); 5]),
        ]));
        let rows = decode_rows(&body).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_empty());
        assert_eq!(rows[1].len(), 5);
    }

    #[test]
    fn non_array_body_is_rejected() {
        let body = encode_value(&Value::from("nope"));
        assert!(matches!(decode_rows(&body), Err(VectorError::Decode(_))));
        assert!(matches!(decode_rows(&[]), Err(VectorError::Decode(_))));
    }

    #[test]
    fn single_row_body() {
        let body = encode_value(&Value::Array(vec![Value::from("id"), Value::Nil]));
        assert_eq!(decode_row(&body).unwrap().len(), 2);

        let body = encode_value(&Value::from(3));
        assert!(matches!(decode_row(&body), Err(VectorError::Decode(_))));
    }

    #[test]
    fn stored_record_roundtrip() {
        let record = VectorRecord::new("r1", vec![0.0, 2.0])
            .with_sparse(vec![1, 7], vec![0.3, 0.4])
            .with_metadata(attrs(json!({"title": "x"})))
            .with_filter(attrs(json!({"year": 2024})));
        let body = encode_batch(std::slice::from_ref(&record), 2, SpaceType::Cosine).unwrap();
        let rows = decode_rows(&body).unwrap();

        let back = decode_stored(&rows[0], &mut Vec::new()).unwrap();
        assert_eq!(back.id, "r1");
        assert_eq!(back.vector, vec![0.0, 1.0]);
        assert_eq!(back.sparse, record.sparse);
        assert_eq!(back.metadata, record.metadata);
        assert_eq!(back.filter, record.filter);
    }

    #[test]
    fn unreadable_sparse_indices_keep_both_halves_aligned() {
        let row = vec![
            Value::from("r2"),
            Value::Binary(Vec::new()),
            Value::from(""),
            Value::F32(1.0),
            Value::Array(vec![Value::F32(0.5), Value::F32(0.5)]),
            Value::Array(vec![
                Value::from(1),
                Value::from(-1),
                Value::from(5_000_000_000u64),
                Value::from(2),
            ]),
            Value::Array(vec![
                Value::F32(0.1),
                Value::F32(0.2),
                Value::F32(0.3),
                Value::F32(0.4),
            ]),
        ];

        let back = decode_stored(&row, &mut Vec::new()).unwrap();
        let sparse = back.sparse.expect("sparse part");
        assert!(sparse.is_consistent());
        assert_eq!(sparse.indices, vec![1, 0, 0, 2]);
        assert_eq!(sparse.values, vec![0.1, 0.2, 0.3, 0.4]);
    }
}
