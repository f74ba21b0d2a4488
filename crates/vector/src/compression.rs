//! zlib-wrapped JSON blobs for record metadata.

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use crate::{Attributes, VectorError};

/// Serializes `data` to JSON and zlib-compresses it.
///
/// An empty mapping encodes to zero bytes. `scratch` holds the intermediate
/// JSON and is left cleared on return so callers can hand it back to a pool.
pub fn json_zip(data: &Attributes, scratch: &mut Vec<u8>) -> Result<Vec<u8>, VectorError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    scratch.clear();
    serde_json::to_writer(&mut *scratch, data)?;

    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(scratch.len() / 2 + 16),
        Compression::default(),
    );
    let written = encoder.write_all(scratch.as_slice());
    scratch.clear();
    written?;
    Ok(encoder.finish()?)
}

/// Inverse of [`json_zip`]. Zero bytes decode to an empty mapping.
pub fn json_unzip(data: &[u8], scratch: &mut Vec<u8>) -> Result<Attributes, VectorError> {
    if data.is_empty() {
        return Ok(Attributes::new());
    }

    scratch.clear();
    let parsed = match ZlibDecoder::new(data).read_to_end(scratch) {
        Ok(_) => serde_json::from_slice::<Attributes>(scratch.as_slice()).map_err(VectorError::from),
        Err(err) => Err(VectorError::from(err)),
    };
    scratch.clear();
    parsed
}
