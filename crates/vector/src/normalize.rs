use std::borrow::Cow;

use crate::{SpaceType, VectorError};

/// A vector ready for upload together with the norm it was divided by.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<'a> {
    pub vector: Cow<'a, [f32]>,
    pub norm: f32,
}

/// Validates `vector` against `dimension` and, for cosine indices, scales it
/// to unit length.
///
/// Non-cosine spaces and the zero vector are passed through untouched with a
/// norm of `1.0`, so no allocation happens on those paths.
pub fn normalize(
    vector: &[f32],
    dimension: usize,
    space: SpaceType,
) -> Result<Normalized<'_>, VectorError> {
    if vector.len() != dimension {
        return Err(VectorError::DimensionMismatch {
            expected: dimension,
            actual: vector.len(),
        });
    }

    if !space.is_cosine() {
        return Ok(Normalized {
            vector: Cow::Borrowed(vector),
            norm: 1.0,
        });
    }

    let norm = l2_norm(vector);
    if norm == 0.0 {
        return Ok(Normalized {
            vector: Cow::Borrowed(vector),
            norm: 1.0,
        });
    }

    Ok(Normalized {
        vector: Cow::Owned(vector.iter().map(|x| x / norm).collect()),
        norm,
    })
}

/// Euclidean length. Accumulates in f32 so the loop auto-vectorizes.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
