//! Line-wise recursive filtering
//!
//! One forward (causal) and one backward (anti-causal) second-order
//! recursion over a 1-D sequence. Running both directions doubles the
//! filter order and cancels the phase lag of a single causal pass, so the
//! smoothing comes out symmetric.
//!
//! Boundary handling is the delicate part: the recursion has no samples
//! before the line start or past its end. With edge compensation on, the
//! average of the first/last few samples stands in for the missing
//! context; with it off the context is zero, which reads as black outside
//! the frame and attenuates the line ends.

use super::coeffs::{Biquad, EdgeTaps};
use super::EDGE_AVG;

/// Edge-average window for a line of length `n`
#[inline]
pub(crate) fn edge_window(n: usize) -> usize {
    EDGE_AVG.min(n / 2)
}

/// Average of the first `win` samples
#[inline]
pub(crate) fn head_average(line: &[f32], win: usize) -> f32 {
    line[..win].iter().sum::<f32>() / win as f32
}

/// Average of the last `win` samples
#[inline]
pub(crate) fn tail_average(line: &[f32], win: usize) -> f32 {
    line[line.len() - win..].iter().sum::<f32>() / win as f32
}

/// Forward (causal) pass: `y[i] = scale*x[i] - a1*y[i-1] - a2*y[i-2]`
///
/// `scale` multiplies every input sample; the caller folds the whole
/// four-pass normalization into the first pass. `context` is the assumed
/// signal level before the line start, in raw input units: the first two
/// outputs are seeded from the recursion's steady state at that level
/// instead of from zero.
pub fn forward(line: &mut [f32], bq: &Biquad, scale: f32, context: f32) {
    debug_assert!(line.len() >= 2);
    let c = scale * context;
    let seed = bq.gain * c;
    line[0] = scale * line[0] - (bq.a1 + bq.a2) * seed;
    line[1] = scale * line[1] - bq.a1 * line[0] - bq.a2 * seed;
    for i in 2..line.len() {
        line[i] = scale * line[i] - bq.a1 * line[i - 1] - bq.a2 * line[i - 2];
    }
}

/// Backward (anti-causal) pass: `y[i] = y[i] - a1*y[i+1] - a2*y[i+2]`
///
/// The two final samples are replaced through the trailing-edge
/// compensation taps; `context` is the assumed continuation level past the
/// line end, in the units of this pass's input.
pub fn backward(line: &mut [f32], bq: &Biquad, taps: &EdgeTaps, context: f32) {
    let n = line.len();
    debug_assert!(n >= 4);
    let (rep1, rep2) = taps.continuation(line[n - 2], line[n - 1], context);
    line[n - 1] = line[n - 1] - bq.a1 * rep1 - bq.a2 * rep2;
    line[n - 2] = line[n - 2] - bq.a1 * line[n - 1] - bq.a2 * rep1;
    for i in (0..n - 2).rev() {
        line[i] = line[i] - bq.a1 * line[i + 1] - bq.a2 * line[i + 2];
    }
}

/// Zero-phase pass over one line: forward then backward, in place
///
/// Lines shorter than 4 samples pass through unmodified; there are not
/// enough samples for the two-tap recursion and its boundary seeds.
pub fn filter_line(line: &mut [f32], bq: &Biquad, taps: &EdgeTaps, scale: f32, ec: bool) {
    let n = line.len();
    if n < 4 {
        return;
    }
    let win = edge_window(n);
    // tail context comes from the raw input, before the forward pass
    // rewrites it
    let (head, tail) = if ec {
        (head_average(line, win), tail_average(line, win))
    } else {
        (0.0, 0.0)
    };
    forward(line, bq, scale, head);
    backward(line, bq, taps, scale * tail);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Biquad, EdgeTaps) {
        let bq = Biquad::lowpass(0.2, 0.7);
        let taps = EdgeTaps::derive(&bq);
        (bq, taps)
    }

    #[test]
    fn test_short_line_passthrough() {
        let (bq, taps) = setup();
        let mut line = [5.0f32, 6.0, 7.0];
        let orig = line;
        filter_line(&mut line, &bq, &taps, 1.0, true);
        assert_eq!(line, orig);
    }

    #[test]
    fn test_uniform_line_stays_level_with_ec() {
        let (bq, taps) = setup();
        let scale = (1.0 / bq.gain).powi(2);
        let mut line = vec![100.0f32; 64];
        filter_line(&mut line, &bq, &taps, scale, true);
        // forward+backward with full two-pass normalization keeps DC at 1
        for (i, &v) in line.iter().enumerate() {
            assert!((v - 100.0).abs() < 1.0, "line[{}] = {}", i, v);
        }
    }

    #[test]
    fn test_zero_context_darkens_edges() {
        let (bq, taps) = setup();
        let scale = (1.0 / bq.gain).powi(2);
        let mut line = vec![100.0f32; 64];
        filter_line(&mut line, &bq, &taps, scale, false);
        // interior unaffected, line ends pulled toward the assumed black
        assert!((line[32] - 100.0).abs() < 1.0);
        assert!(line[0] < 95.0, "line[0] = {}", line[0]);
        assert!(line[63] < 95.0, "line[63] = {}", line[63]);
    }

    #[test]
    fn test_impulse_spreads_symmetrically() {
        let (bq, taps) = setup();
        let scale = (1.0 / bq.gain).powi(2);
        let mut line = vec![0.0f32; 33];
        line[16] = 255.0;
        filter_line(&mut line, &bq, &taps, scale, false);
        assert!(line[16] > line[12]);
        for d in 1..8 {
            let lo = line[16 - d];
            let hi = line[16 + d];
            assert!(
                (lo - hi).abs() <= 0.02 * line[16].abs() + 1e-3,
                "d={} lo={} hi={}",
                d,
                lo,
                hi
            );
        }
    }
}
