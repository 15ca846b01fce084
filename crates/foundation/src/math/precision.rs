//! Precision policies.
//!
//! Diagram coordinates are written back into SVG attributes, so the
//! textual form of a float has to be stable across loads.

/// Canonicalize a floating-point value.
///
/// Rules:
/// - `-0.0` becomes `0.0`
/// - all NaNs become a single canonical NaN
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        // Handles +0.0 and -0.0.
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Shortest round-trippable decimal form, without a trailing `.0` or a
/// negative zero. `100.0` renders as `100`, `12.5` as `12.5`.
pub fn format_coord(v: f64) -> String {
    format!("{}", canonical_f64(v))
}
