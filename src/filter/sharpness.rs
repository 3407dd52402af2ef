//! Unsharp-mask sharpen and soften
//!
//! Classic unsharp masking: subtract a blurred copy from the source and add
//! the difference back, scaled by the amount. Negative amounts invert the
//! mask and soften instead. The blurred copy comes from a cascade of box
//! averages built incrementally with row and column accumulators, one pass
//! over the plane, no intermediate blurred buffer.
//!
//! Arithmetic is integer throughout: the amount is 16.16 fixed point and
//! the box cascade divides once at the end by its total weight.

use tracing::debug;

use crate::error::Result;
use crate::plugin::params::{map_backward, map_forward};
use crate::plugin::{
    check_frame_len, ColorModel, Effect, ParamInfo, ParamKind, ParamValue, PluginInfo, PluginType,
};

const CHANNELS: usize = 3;
const ALPHA_MASK: u32 = 0xFF00_0000;

const AMOUNT_MIN: f64 = -1.5;
const AMOUNT_MAX: f64 = 3.5;
const SIZE_MIN: f64 = 3.0;
const SIZE_MAX: f64 = 11.0;

/// One plane of unsharp masking
///
/// `amount` is 16.16 fixed point; `steps` is half the mask size. `sr` must
/// hold `2*steps` row accumulators and `sc` `2*steps` column accumulator
/// rows of `width + 2*steps` entries each. Pixels outside the plane read as
/// the nearest edge pixel.
fn unsharp(
    src: &[u8],
    dst: &mut [u8],
    w: usize,
    h: usize,
    amount: i32,
    steps: usize,
    sr: &mut [u32],
    sc: &mut [Vec<u32>],
) {
    let scalebits = (steps * 4) as u32;
    let halfscale = 1u32 << (scalebits - 1);

    for row in sc.iter_mut() {
        row.iter_mut().for_each(|v| *v = 0);
    }

    let si = steps as isize;
    for y in -si..h as isize + si {
        let src2 = y.clamp(0, h as isize - 1) as usize * w;
        sr.iter_mut().for_each(|v| *v = 0);
        for x in -si..w as isize + si {
            let mut tmp1 = src[src2 + x.clamp(0, w as isize - 1) as usize] as u32;
            for z in (0..steps * 2).step_by(2) {
                let tmp2 = sr[z] + tmp1;
                sr[z] = tmp1;
                tmp1 = sr[z + 1] + tmp2;
                sr[z + 1] = tmp2;
            }
            let col = (x + si) as usize;
            for z in (0..steps * 2).step_by(2) {
                let tmp2 = sc[z][col] + tmp1;
                sc[z][col] = tmp1;
                tmp1 = sc[z + 1][col] + tmp2;
                sc[z + 1][col] = tmp2;
            }
            // the accumulator pipeline runs `steps` pixels ahead of the
            // output position in both directions
            if x >= si && y >= si {
                let idx = (y - si) as usize * w + (x - si) as usize;
                let srx = src[idx] as i32;
                let blurred = ((tmp1 + halfscale) >> scalebits) as i32;
                let res = srx + (((srx - blurred) * amount) >> 16);
                dst[idx] = res.clamp(0, 255) as u8;
            }
        }
    }
}

/// Unsharp-mask effect
#[derive(Debug, Clone)]
pub struct Sharpness {
    width: usize,
    height: usize,
    amount: f64,
    msize: usize,
    sr: Vec<u32>,
    sc: Vec<Vec<u32>>,
    plane_in: Vec<u8>,
    plane_out: Vec<u8>,
}

impl Sharpness {
    fn steps(&self) -> usize {
        self.msize / 2
    }

    /// Resize the accumulators for the current mask size
    fn realloc_accumulators(&mut self) {
        let steps = self.steps();
        self.sr = vec![0; 2 * steps];
        self.sc = vec![vec![0; self.width + 2 * steps]; 2 * steps];
    }
}

impl Effect for Sharpness {
    fn info() -> PluginInfo {
        PluginInfo {
            name: "Sharpness",
            author: "quadfilt",
            plugin_type: PluginType::Filter,
            color_model: ColorModel::Packed32,
            major_version: 1,
            minor_version: 1,
            explanation: "Unsharp masking with adjustable size and strength",
        }
    }

    fn params() -> &'static [ParamInfo] {
        &[
            ParamInfo {
                name: "Amount",
                kind: ParamKind::Double,
                explanation: "Strength; negative values soften",
            },
            ParamInfo {
                name: "Size",
                kind: ParamKind::Double,
                explanation: "Mask size",
            },
        ]
    }

    fn new(width: usize, height: usize) -> Result<Sharpness> {
        let mut sharp = Sharpness {
            width,
            height,
            amount: 0.0,
            msize: SIZE_MIN as usize,
            sr: Vec::new(),
            sc: Vec::new(),
            plane_in: vec![0; width * height],
            plane_out: vec![0; width * height],
        };
        sharp.realloc_accumulators();
        Ok(sharp)
    }

    fn set_param(&mut self, index: usize, value: &ParamValue) {
        let Some(v) = value.as_double() else { return };
        match index {
            0 => self.amount = map_forward(v, AMOUNT_MIN, AMOUNT_MAX),
            1 => {
                let msize = map_forward(v, SIZE_MIN, SIZE_MAX).round() as usize;
                if msize != self.msize {
                    self.msize = msize;
                    self.realloc_accumulators();
                    debug!(msize, steps = self.steps(), "resized unsharp mask");
                }
            }
            _ => {}
        }
    }

    fn get_param(&self, index: usize) -> Option<ParamValue> {
        match index {
            0 => Some(ParamValue::Double(map_backward(
                self.amount,
                AMOUNT_MIN,
                AMOUNT_MAX,
            ))),
            1 => Some(ParamValue::Double(map_backward(
                self.msize as f64,
                SIZE_MIN,
                SIZE_MAX,
            ))),
            _ => None,
        }
    }

    fn process(&mut self, _time: f64, input: &[u32], output: &mut [u32]) -> Result<()> {
        check_frame_len(input.len(), self.width, self.height)?;
        check_frame_len(output.len(), self.width, self.height)?;

        if self.amount == 0.0 {
            output.copy_from_slice(input);
            return Ok(());
        }

        let amount = (self.amount * 65536.0) as i32;
        let steps = self.steps();

        for (out, inp) in output.iter_mut().zip(input.iter()) {
            *out = inp & ALPHA_MASK;
        }
        for ch in 0..CHANNELS {
            let shift = 8 * ch as u32;
            for (s, px) in self.plane_in.iter_mut().zip(input.iter()) {
                *s = ((px >> shift) & 0xFF) as u8;
            }
            unsharp(
                &self.plane_in,
                &mut self.plane_out,
                self.width,
                self.height,
                amount,
                steps,
                &mut self.sr,
                &mut self.sc,
            );
            for (out, &v) in output.iter_mut().zip(self.plane_out.iter()) {
                *out |= (v as u32) << shift;
            }
        }
        Ok(())
    }
}
