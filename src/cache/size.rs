//! Size Estimation Module
//!
//! Heuristic byte-size estimates for cached values. The numbers feed
//! `CacheStats::memory_usage` and the stream's memory-pressure check; they
//! are advisory and never enforced on insert.

use serde::Serialize;
use serde_json::Value;

/// Bytes charged per character of text.
pub const BYTES_PER_CHAR: usize = 2;
/// Bytes charged per number.
pub const NUMBER_BYTES: usize = 8;
/// Bytes charged per boolean.
pub const BOOL_BYTES: usize = 4;

// == Estimate Size ==
/// Estimates the in-memory footprint of `value`.
///
/// Text is 2 bytes per character, numbers 8, booleans 4, null 0. Arrays and
/// objects cost twice the length of their canonical JSON serialization.
/// Values that fail to serialize are estimated at 0.
pub fn estimate_size<T: Serialize + ?Sized>(value: &T) -> usize {
    match serde_json::to_value(value) {
        Ok(value) => estimate_json_size(&value),
        Err(_) => 0,
    }
}

/// Estimates the footprint of an already-converted JSON value.
pub fn estimate_json_size(value: &Value) -> usize {
    match value {
        Value::Null => 0,
        Value::Bool(_) => BOOL_BYTES,
        Value::Number(_) => NUMBER_BYTES,
        Value::String(s) => s.chars().count() * BYTES_PER_CHAR,
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value)
            .map(|json| json.len() * 2)
            .unwrap_or(0),
    }
}
