//! Best-effort conversions from loosely typed msgpack values.
//!
//! The service may encode numbers with any integer width or either float
//! width depending on the value. Everything funnels through [`to_f32`] so the
//! fallback behavior lives in one place: unrecognized values become `0.0`.

use rmpv::Value;

/// Coerces any numeric msgpack value to `f32`.
///
/// Integers and `f32` convert exactly when representable; `f64` is narrowed.
/// `nil`, strings, and containers yield `0.0`.
pub fn to_f32(value: &Value) -> f32 {
    match value {
        Value::F32(v) => *v,
        Value::F64(v) => *v as f32,
        Value::Integer(int) => {
            if let Some(v) = int.as_i64() {
                v as f32
            } else if let Some(v) = int.as_u64() {
                v as f32
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Coerces a msgpack value to a non-negative index. Negative, fractional,
/// oversized or non-numeric values yield `None`.
pub fn to_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Integer(int) => int.as_u64().and_then(|v| u32::try_from(v).ok()),
        _ => None,
    }
}

/// Maps an array of numbers to `f32`s. Non-arrays yield `None`.
pub fn to_f32_vec(value: &Value) -> Option<Vec<f32>> {
    match value {
        Value::Array(items) => Some(items.iter().map(to_f32).collect()),
        _ => None,
    }
}

/// Maps an array of indices to `u32`s, keeping its length. Entries
/// [`to_u32`] rejects become `0`. Non-arrays yield `None`.
pub fn to_u32_vec(value: &Value) -> Option<Vec<u32>> {
    match value {
        Value::Array(items) => Some(items.iter().map(|item| to_u32(item).unwrap_or(0)).collect()),
        _ => None,
    }
}

/// Raw bytes of a `bin` or `str` value. Anything else is empty.
pub fn to_bytes(value: &Value) -> &[u8] {
    match value {
        Value::Binary(bytes) => bytes.as_slice(),
        Value::String(s) => s.as_bytes(),
        _ => &[],
    }
}

/// Text form of a value: strings and binaries as UTF-8 (lossy), `nil` as the
/// empty string, anything else through its display form.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Nil => String::new(),
        Value::String(s) => match s.as_str() {
            Some(text) => text.to_owned(),
            None => String::from_utf8_lossy(s.as_bytes()).into_owned(),
        },
        Value::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        other => other.to_string(),
    }
}
