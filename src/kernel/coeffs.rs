//! Biquad coefficient derivation
//!
//! Turns a user-facing cutoff frequency and quality factor into the
//! feedback coefficients driving the recursive passes, and solves for the
//! trailing-edge compensation taps reused by every backward pass.

use std::f32::consts::PI;

/// Length of the trailing-edge compensation solve
const REP_LEN: usize = 256;

/// Hard cap on the compensation solve length
const REP_MAX: usize = 8192;

/// Feedback coefficients of a second-order recursive low-pass
///
/// The recursion runs with an implicit unit leading coefficient:
/// `y[i] = x[i] - a1*y[i-1] - a2*y[i-2]`, so a single pass has DC gain
/// `gain = 1/(1 + a1 + a2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub a1: f32,
    pub a2: f32,
    pub gain: f32,
}

impl Biquad {
    /// Second-order low-pass design
    ///
    /// `f` is the cutoff as a fraction of Nyquist and must lie strictly
    /// inside (0, 0.5); `q` must be positive. Callers clamp user-facing
    /// parameters into this domain before calling; the derivation itself
    /// does not police it.
    ///
    /// Standard biquad design:
    ///
    /// ```text
    /// a  = sin(pi*f) / (2*q)       b  = cos(pi*f)
    /// b0 = b2 = (1 - b)/2          b1 = 1 - b
    /// a0 = 1 + a    a1 = -2*b      a2 = 1 - a
    /// ```
    ///
    /// Feedback terms come back normalized by `a0`; the feedforward terms
    /// collapse into the per-plane normalization and are not materialized.
    pub fn lowpass(f: f32, q: f32) -> Biquad {
        debug_assert!(f > 0.0 && f < 0.5, "cutoff {} outside (0, 0.5)", f);
        debug_assert!(q > 0.0, "quality factor {} not positive", q);

        let a = (PI * f).sin() / (2.0 * q);
        let b = (PI * f).cos();
        let a0 = 1.0 + a;
        let a1 = -2.0 * b / a0;
        let a2 = (1.0 - a) / a0;
        Biquad {
            a1,
            a2,
            gain: 1.0 / (1.0 + a1 + a2),
        }
    }
}

/// Precomputed taps for the trailing-edge compensation
///
/// The backward pass has no future samples beyond the line end, so the two
/// final outputs are reconstructed from the last two forward-pass values
/// decomposed into their mean (`rs`), difference (`rd`) and an assumed
/// continuation level (`rc`). Derived once per coefficient set and reused
/// for every line of every plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeTaps {
    pub rd1: f32,
    pub rd2: f32,
    pub rs1: f32,
    pub rs2: f32,
    pub rc1: f32,
    pub rc2: f32,
}

impl EdgeTaps {
    /// Solve the compensation taps for one coefficient set
    pub fn derive(bq: &Biquad) -> EdgeTaps {
        let (rd1, rd2) = rep(-0.5, 0.5, 0.0, REP_LEN, bq);
        let (rs1, rs2) = rep(1.0, 1.0, 0.0, REP_LEN, bq);
        let (rc1, rc2) = rep(0.0, 0.0, 1.0, REP_LEN, bq);
        EdgeTaps {
            rd1,
            rd2,
            rs1,
            rs2,
            rc1,
            rc2,
        }
    }

    /// Virtual continuation of a line beyond its trailing edge
    ///
    /// `prev` and `last` are the final two forward-pass outputs, `context`
    /// the assumed signal level past the edge in forward-input units.
    /// Returns the two backward-pass samples just outside the line.
    #[inline]
    pub fn continuation(&self, prev: f32, last: f32, context: f32) -> (f32, f32) {
        let mean = (last + prev) * 0.5;
        let diff = last - prev;
        (
            mean * self.rs1 + diff * self.rd1 + context * self.rc1,
            mean * self.rs2 + diff * self.rd2 + context * self.rc2,
        )
    }
}

/// Steady-state solve for the trailing-edge response
///
/// Runs the forward recursion from boundary values `v1`, `v2` with constant
/// input `c` for `n` samples, then the backward recursion over the result,
/// and returns the first two backward outputs. Linear in (v1, v2, c), which
/// is what lets [`EdgeTaps::derive`] factor the solve into reusable taps.
fn rep(v1: f32, v2: f32, c: f32, n: usize, bq: &Biquad) -> (f32, f32) {
    let n = n.clamp(4, REP_MAX);
    let mut lb = vec![0.0f32; n];

    lb[0] = v1;
    lb[1] = v2;
    for i in 2..n - 2 {
        lb[i] = c - bq.a1 * lb[i - 1] - bq.a2 * lb[i - 2];
    }

    lb[n - 2] = 0.0;
    lb[n - 1] = 0.0;
    for i in (0..n - 2).rev() {
        lb[i] = lb[i] - bq.a1 * lb[i + 1] - bq.a2 * lb[i + 2];
    }

    (lb[0], lb[1])
}
