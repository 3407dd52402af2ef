//! Frame adapter
//!
//! Converts between packed 32-bit pixel buffers and per-channel f32
//! planes. The three color channels live in the low three bytes of each
//! word, alpha in the most significant byte; filtering never touches
//! alpha, it is copied through from the input verbatim.
//!
//! Plane buffers are allocated once at construction and reused across
//! frames, so a `process` call performs no per-frame allocation.

use crate::error::Result;
use crate::plugin::check_frame_len;

use super::plane::{Plane, PlaneFilter};

const CHANNELS: usize = 3;
const ALPHA_MASK: u32 = 0xFF00_0000;

/// Drives the plane filter over every color channel of a packed frame
#[derive(Debug, Clone)]
pub struct FrameSmoother {
    width: usize,
    height: usize,
    planes: [Plane; CHANNELS],
}

impl FrameSmoother {
    /// Allocate reusable channel planes for the given frame size
    pub fn new(width: usize, height: usize) -> FrameSmoother {
        FrameSmoother {
            width,
            height,
            planes: [
                Plane::new(width, height),
                Plane::new(width, height),
                Plane::new(width, height),
            ],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Filter one packed frame into `output`
    ///
    /// Each channel runs through its own `PlaneFilter`, so chroma may be
    /// smoothed differently from luma-carrying channels; pass the same
    /// filter three times for uniform smoothing. Filtered samples saturate
    /// to [0, 255] on re-interleave; alpha is copied from the input.
    pub fn process(
        &mut self,
        input: &[u32],
        output: &mut [u32],
        filters: [&PlaneFilter; CHANNELS],
        ec: bool,
    ) -> Result<()> {
        check_frame_len(input.len(), self.width, self.height)?;
        check_frame_len(output.len(), self.width, self.height)?;

        for (ch, plane) in self.planes.iter_mut().enumerate() {
            let shift = 8 * ch as u32;
            let samples = plane.samples_mut();
            for (s, px) in samples.iter_mut().zip(input.iter()) {
                *s = ((px >> shift) & 0xFF) as f32;
            }
            filters[ch].smooth(plane, ec);
        }

        let (p0, p1, p2) = (
            self.planes[0].samples(),
            self.planes[1].samples(),
            self.planes[2].samples(),
        );
        for (i, out) in output.iter_mut().enumerate() {
            *out = clamp_u8(p0[i])
                | (clamp_u8(p1[i]) << 8)
                | (clamp_u8(p2[i]) << 16)
                | (input[i] & ALPHA_MASK);
        }
        Ok(())
    }
}

/// Saturate a filtered sample back to an 8-bit channel value
#[inline]
fn clamp_u8(v: f32) -> u32 {
    v.round().clamp(0.0, 255.0) as u32
}
