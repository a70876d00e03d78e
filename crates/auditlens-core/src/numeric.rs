//! Normalization of aggregate values read back from storage.
//!
//! `SUM` and `AVG` yield NULL over empty groups. Every aggregate crosses the
//! storage boundary through these helpers so an empty window reads as 0
//! instead of leaking NULLs (or NaN) into responses.

/// NULL or non-finite → 0.0.
pub fn to_number(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// NULL → 0.
pub fn to_count(value: Option<i64>) -> i64 {
    value.unwrap_or(0)
}

/// Round to two decimals for averages shown on dashboards.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
