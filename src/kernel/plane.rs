//! Plane filter driver
//!
//! Runs the line-wise recursion over a full 2-D plane so the smoothing is
//! isotropic: every row left→right then right→left, then every column
//! top→bottom and bottom→up. The vertical passes sweep row-major over the
//! flat sample buffer instead of gathering columns, which keeps the inner
//! loops sequential in memory; the arithmetic per column is identical to a
//! per-column application of the line filter.
//!
//! The four passes form an ordered pipeline: the horizontal pair completes
//! for every row before the vertical passes read any of them, and the
//! downward pass completes before the upward pass starts.

use super::coeffs::{Biquad, EdgeTaps};
use super::line;
use super::EDGE_AVG;

/// A single-channel 2-D grid of f32 samples
#[derive(Debug, Clone)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Plane {
    /// Create a zero-filled plane
    pub fn new(width: usize, height: usize) -> Plane {
        Plane {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Create a plane from existing samples
    ///
    /// Returns `None` when the sample count does not match the dimensions.
    pub fn from_samples(width: usize, height: usize, data: Vec<f32>) -> Option<Plane> {
        if data.len() != width * height {
            return None;
        }
        Some(Plane {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Flat row-major sample access
    pub fn samples(&self) -> &[f32] {
        &self.data
    }

    /// Flat row-major mutable sample access
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Sample at (x, y)
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Set the sample at (x, y)
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        self.data[y * self.width + x] = v;
    }
}

/// Four-direction recursive smoothing over one plane
///
/// Holds one coefficient set and its trailing-edge taps; stateless across
/// calls, every invocation is a complete pass over the supplied plane.
#[derive(Debug, Clone)]
pub struct PlaneFilter {
    bq: Biquad,
    taps: EdgeTaps,
}

impl PlaneFilter {
    /// Build a filter from a coefficient set, solving the edge taps once
    pub fn new(bq: Biquad) -> PlaneFilter {
        PlaneFilter {
            taps: EdgeTaps::derive(&bq),
            bq,
        }
    }

    pub fn coeffs(&self) -> &Biquad {
        &self.bq
    }

    /// Smooth the plane in place
    ///
    /// `ec` enables edge compensation at all four boundaries. Planes
    /// narrower or shorter than 4 samples pass through unmodified; the
    /// boundary math needs at least two seed and two tail samples per
    /// direction.
    pub fn smooth(&self, plane: &mut Plane, ec: bool) {
        let (w, h) = (plane.width, plane.height);
        if w < 4 || h < 4 {
            return;
        }

        // the whole four-pass normalization is folded into the first pass:
        // each of the four directions contributes DC gain `gain`, so
        // scaling the first pass input by gain^-4 keeps flat fields flat
        let norm = (1.0 / self.bq.gain).powi(4);

        for row in plane.data.chunks_exact_mut(w) {
            line::filter_line(row, &self.bq, &self.taps, norm, ec);
        }
        self.vertical_down(plane, ec);
        self.vertical_up(plane, ec);
    }

    /// Top→bottom pass, row-major
    fn vertical_down(&self, plane: &mut Plane, ec: bool) {
        let (w, h) = (plane.width, plane.height);
        let s = &mut plane.data;
        let (a1, a2, g) = (self.bq.a1, self.bq.a2, self.bq.gain);
        let win = EDGE_AVG.min(h / 2);

        // seed the top two rows per column; context is the column-head
        // average of the already horizontally filtered data
        for x in 0..w {
            let c = if ec {
                let mut sum = 0.0;
                for y in 0..win {
                    sum += s[x + y * w];
                }
                sum / win as f32
            } else {
                0.0
            };
            let seed = g * c;
            s[x] -= (a1 + a2) * seed;
            s[x + w] = s[x + w] - a1 * s[x] - a2 * seed;
        }

        for y in 2..h {
            let row = y * w;
            for x in 0..w {
                s[row + x] = s[row + x] - a1 * s[row - w + x] - a2 * s[row - 2 * w + x];
            }
        }
    }

    /// Bottom→top pass, row-major
    fn vertical_up(&self, plane: &mut Plane, ec: bool) {
        let (w, h) = (plane.width, plane.height);
        let s = &mut plane.data;
        let (a1, a2, g) = (self.bq.a1, self.bq.a2, self.bq.gain);
        let win = EDGE_AVG.min(h / 2);
        let h1 = (h - 1) * w;
        let h2 = (h - 2) * w;

        // rebuild the bottom two rows through the compensation taps
        for x in 0..w {
            let c = if ec {
                // the column tail holds fully downward-filtered samples;
                // dividing by the single-pass gain recovers the level this
                // pass's input would continue at below the frame
                let mut sum = 0.0;
                for y in h - win..h {
                    sum += s[x + y * w];
                }
                sum / (win as f32 * g)
            } else {
                0.0
            };
            let (rep1, rep2) = self.taps.continuation(s[x + h2], s[x + h1], c);
            s[x + h1] = s[x + h1] - a1 * rep1 - a2 * rep2;
            s[x + h2] = s[x + h2] - a1 * s[x + h1] - a2 * rep1;
        }

        for y in (0..h - 2).rev() {
            let row = y * w;
            for x in 0..w {
                s[row + x] = s[row + x] - a1 * s[row + w + x] - a2 * s[row + 2 * w + x];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> PlaneFilter {
        PlaneFilter::new(Biquad::lowpass(0.2, 0.7))
    }

    #[test]
    fn test_degenerate_plane_passthrough() {
        let f = filter();
        let mut plane = Plane::from_samples(3, 3, vec![7.0; 9]).unwrap();
        let orig = plane.samples().to_vec();
        f.smooth(&mut plane, true);
        assert_eq!(plane.samples(), &orig[..]);

        let mut narrow = Plane::from_samples(2, 16, vec![7.0; 32]).unwrap();
        let orig = narrow.samples().to_vec();
        f.smooth(&mut narrow, false);
        assert_eq!(narrow.samples(), &orig[..]);
    }

    #[test]
    fn test_uniform_plane_stays_level_with_ec() {
        let f = filter();
        let mut plane = Plane::from_samples(32, 24, vec![200.0; 32 * 24]).unwrap();
        f.smooth(&mut plane, true);
        for y in 0..24 {
            for x in 0..32 {
                let v = plane.get(x, y);
                assert!((v - 200.0).abs() < 4.0, "({}, {}) = {}", x, y, v);
            }
        }
    }

    #[test]
    fn test_uniform_plane_darkens_at_border_without_ec() {
        let f = filter();
        let mut plane = Plane::from_samples(32, 24, vec![200.0; 32 * 24]).unwrap();
        f.smooth(&mut plane, false);
        // interior keeps its level, corners sag toward assumed black
        assert!((plane.get(16, 12) - 200.0).abs() < 2.0);
        assert!(plane.get(0, 0) < 190.0, "corner = {}", plane.get(0, 0));
    }

    #[test]
    fn test_impulse_response_centered_and_symmetric() {
        let f = filter();
        let mut plane = Plane::new(16, 16);
        plane.set(8, 8, 255.0);
        f.smooth(&mut plane, false);

        let peak = plane.get(8, 8);
        assert!(peak > 0.0);
        for (x, y) in [(7, 8), (9, 8), (8, 7), (8, 9)] {
            assert!(plane.get(x, y) < peak);
        }
        for d in 1..5usize {
            let left = plane.get(8 - d, 8);
            let right = plane.get(8 + d, 8);
            let up = plane.get(8, 8 - d);
            let down = plane.get(8, 8 + d);
            let tol = 0.03 * peak + 1e-3;
            assert!((left - right).abs() < tol, "d={} l={} r={}", d, left, right);
            assert!((up - down).abs() < tol, "d={} u={} d={}", d, up, down);
            assert!((left - up).abs() < tol, "d={} l={} u={}", d, left, up);
        }
    }

    #[test]
    fn test_impulse_energy_roughly_conserved() {
        let f = filter();
        let mut plane = Plane::new(16, 16);
        plane.set(8, 8, 255.0);
        f.smooth(&mut plane, false);
        let sum: f32 = plane.samples().iter().sum();
        // unity DC gain; a little energy leaks past the zero-context borders
        assert!(
            (sum - 255.0).abs() < 0.1 * 255.0,
            "energy sum = {} vs 255",
            sum
        );
    }
}
