//! Guarded arithmetic.
//!
//! RULE: every ratio in the crate goes through `safe_div`. A non-finite
//! intermediate never reaches the data model; it is replaced locally by the
//! fallback the call site names.

/// `num / den`, or 0.0 when the divisor is zero or the result is not finite.
pub fn safe_div(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        return 0.0;
    }
    finite_or(num / den, 0.0)
}

/// `value` if finite, else `fallback`.
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        log::trace!("non-finite intermediate {value} replaced by {fallback}");
        fallback
    }
}

/// Round to the nearest integer count, 0 for non-finite input.
pub fn round_count(value: f64) -> i64 {
    finite_or(value, 0.0).round() as i64
}

/// Relative closeness used for the bridge and detail-sum invariants.
pub fn approx_eq(a: f64, b: f64, rel_tol: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= rel_tol * scale
}
