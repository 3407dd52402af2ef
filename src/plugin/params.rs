//! Parameter value mapping
//!
//! Hosts hand every double parameter over as a normalized value in [0, 1].
//! These helpers stretch that value onto an effect's working range and
//! collapse it back for readback. Inputs are clamped, never rejected.

/// Stretch a normalized [0, 1] value to [min, max], linear
pub fn map_forward(v: f64, min: f64, max: f64) -> f64 {
    min + (max - min) * v.clamp(0.0, 1.0)
}

/// Collapse from [min, max] back to [0, 1], linear
pub fn map_backward(v: f64, min: f64, max: f64) -> f64 {
    ((v - min) / (max - min)).clamp(0.0, 1.0)
}

/// Stretch a normalized [0, 1] value to [min, max], logarithmic
///
/// Geometric around `sqrt(min * max)`; `min` and `max` must be positive.
pub fn map_forward_log(v: f64, min: f64, max: f64) -> f64 {
    let sr = (min * max).sqrt();
    let k = 2.0 * (max / sr).ln();
    sr * (k * (v.clamp(0.0, 1.0) - 0.5)).exp()
}

/// Collapse from [min, max] back to [0, 1], logarithmic
///
/// `min`, `max` and `v` must be positive.
pub fn map_backward_log(v: f64, min: f64, max: f64) -> f64 {
    let sr = (min * max).sqrt();
    let k = 2.0 * (max / sr).ln();
    ((v / sr).ln() / k + 0.5).clamp(0.0, 1.0)
}
