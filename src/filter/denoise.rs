//! Spatio-temporal denoiser
//!
//! Adaptive first-order low-pass over space and time in 16.16 fixed point.
//! The amount each neighbour pulls on a pixel depends on how similar the two
//! are: small differences are treated as noise and averaged away, large ones
//! as real detail and left alone. The similarity curve is precomputed into a
//! lookup table indexed by the pixel difference, so the inner loops are pure
//! integer arithmetic.
//!
//! Temporal filtering keeps the previous filtered frame per channel at
//! 16-bit depth; the extra fractional bits let slow changes accumulate
//! instead of being rounded away, which is what makes the temporal pass so
//! effective on static scenes.

use tracing::debug;

use crate::error::Result;
use crate::plugin::params::{map_backward, map_forward};
use crate::plugin::{
    check_frame_len, ColorModel, Effect, ParamInfo, ParamKind, ParamValue, PluginInfo, PluginType,
};

const CHANNELS: usize = 3;
const ALPHA_MASK: u32 = 0xFF00_0000;

/// Difference lookup table: 16 sub-steps per 8-bit level, both signs
const LUT_SIZE: usize = 512 * 16;
const LUT_CENTER: i32 = 256 * 16;

/// Strength range of both controls, in filter units
const STRENGTH_MAX: f64 = 100.0;

/// Build the similarity-weighted correction table for one strength
///
/// `dist25` is the pixel difference at which the correction falls to a
/// quarter; the gamma fit shapes the curve so strength behaves perceptually
/// linearly. Entries hold the signed 16.16 correction toward the neighbour.
fn precalc_coefs(dist25: f64) -> Vec<i32> {
    let mut ct = vec![0i32; LUT_SIZE];
    let gamma = 0.25f64.ln() / (1.0 - dist25 / 255.0 - 0.00001).ln();
    for i in -255 * 16..=255 * 16i32 {
        let simil = 1.0 - (i as f64).abs() / (16.0 * 255.0);
        let c = simil.powf(gamma) * 65536.0 * i as f64 / 16.0;
        ct[(LUT_CENTER + i) as usize] = if c < 0.0 { (c - 0.5) as i32 } else { (c + 0.5) as i32 };
    }
    ct
}

/// One adaptive low-pass step: pull `curr` toward `prev` by the table weight
///
/// Both values are 16.16; the bias before the shift centers the difference
/// onto the table and rounds to its 12-bit resolution.
#[inline]
fn low_pass_mul(prev: u32, curr: u32, coef: &[i32]) -> u32 {
    let d = ((prev as i32 - curr as i32 + 0x0100_07FF) >> 12) as usize;
    curr.wrapping_add(coef[d] as u32)
}

/// Round a 16.16 accumulator down to an 8-bit channel value
#[inline]
fn to_u8(v: u32) -> u8 {
    (v.wrapping_add(0x1000_7FFF) >> 16) as u8
}

/// Round a 16.16 accumulator to the 16-bit history format
#[inline]
fn to_u16(v: u32) -> u16 {
    (v.wrapping_add(0x1000_007F) >> 8) as u16
}

/// Spatial-only pass: left neighbour then top neighbour, single sweep
fn denoise_spatial(src: &[u8], dst: &mut [u8], line: &mut [u32], w: usize, h: usize, coef: &[i32]) {
    let mut pixel_ant = (src[0] as u32) << 16;
    line[0] = pixel_ant;
    dst[0] = to_u8(pixel_ant);
    for x in 1..w {
        pixel_ant = low_pass_mul(pixel_ant, (src[x] as u32) << 16, coef);
        line[x] = pixel_ant;
        dst[x] = to_u8(pixel_ant);
    }

    for y in 1..h {
        let row = y * w;
        let mut pixel_ant = (src[row] as u32) << 16;
        line[0] = low_pass_mul(line[0], pixel_ant, coef);
        dst[row] = to_u8(line[0]);
        for x in 1..w {
            pixel_ant = low_pass_mul(pixel_ant, (src[row + x] as u32) << 16, coef);
            line[x] = low_pass_mul(line[x], pixel_ant, coef);
            dst[row + x] = to_u8(line[x]);
        }
    }
}

/// Temporal-only pass against the 16-bit history plane
fn denoise_temporal(src: &[u8], dst: &mut [u8], prev: &mut [u16], coef: &[i32]) {
    for ((s, d), p) in src.iter().zip(dst.iter_mut()).zip(prev.iter_mut()) {
        let px = low_pass_mul((*p as u32) << 8, (*s as u32) << 16, coef);
        *p = to_u16(px);
        *d = to_u8(px);
    }
}

/// Combined pass: spatial smoothing feeds the temporal accumulator
fn denoise_combined(
    src: &[u8],
    dst: &mut [u8],
    line: &mut [u32],
    prev: &mut [u16],
    w: usize,
    h: usize,
    coef_s: &[i32],
    coef_t: &[i32],
) {
    let mut pixel_ant = (src[0] as u32) << 16;
    line[0] = pixel_ant;
    let mut px = low_pass_mul((prev[0] as u32) << 8, pixel_ant, coef_t);
    prev[0] = to_u16(px);
    dst[0] = to_u8(px);
    for x in 1..w {
        pixel_ant = low_pass_mul(pixel_ant, (src[x] as u32) << 16, coef_s);
        line[x] = pixel_ant;
        px = low_pass_mul((prev[x] as u32) << 8, pixel_ant, coef_t);
        prev[x] = to_u16(px);
        dst[x] = to_u8(px);
    }

    for y in 1..h {
        let row = y * w;
        let mut pixel_ant = (src[row] as u32) << 16;
        line[0] = low_pass_mul(line[0], pixel_ant, coef_s);
        let px = low_pass_mul((prev[row] as u32) << 8, line[0], coef_t);
        prev[row] = to_u16(px);
        dst[row] = to_u8(px);
        for x in 1..w {
            pixel_ant = low_pass_mul(pixel_ant, (src[row + x] as u32) << 16, coef_s);
            line[x] = low_pass_mul(line[x], pixel_ant, coef_s);
            let px = low_pass_mul((prev[row + x] as u32) << 8, line[x], coef_t);
            prev[row + x] = to_u16(px);
            dst[row + x] = to_u8(px);
        }
    }
}

/// 3-D denoise effect
#[derive(Debug, Clone)]
pub struct Denoise3d {
    width: usize,
    height: usize,
    spatial: f64,
    temporal: f64,
    coef_spatial: Vec<i32>,
    coef_temporal: Vec<i32>,
    line: Vec<u32>,
    prev: [Option<Vec<u16>>; CHANNELS],
    plane_in: Vec<u8>,
    plane_out: Vec<u8>,
}

impl Effect for Denoise3d {
    fn info() -> PluginInfo {
        PluginInfo {
            name: "Denoise 3D",
            author: "quadfilt",
            plugin_type: PluginType::Filter,
            color_model: ColorModel::Packed32,
            major_version: 1,
            minor_version: 1,
            explanation: "High quality 3D denoiser",
        }
    }

    fn params() -> &'static [ParamInfo] {
        &[
            ParamInfo {
                name: "Spatial",
                kind: ParamKind::Double,
                explanation: "Amount of spatial filtering",
            },
            ParamInfo {
                name: "Temporal",
                kind: ParamKind::Double,
                explanation: "Amount of temporal filtering",
            },
        ]
    }

    fn new(width: usize, height: usize) -> Result<Denoise3d> {
        let spatial = 4.0;
        let temporal = 6.0;
        Ok(Denoise3d {
            width,
            height,
            spatial,
            temporal,
            coef_spatial: precalc_coefs(spatial),
            coef_temporal: precalc_coefs(temporal),
            line: vec![0; width],
            prev: [None, None, None],
            plane_in: vec![0; width * height],
            plane_out: vec![0; width * height],
        })
    }

    fn set_param(&mut self, index: usize, value: &ParamValue) {
        let Some(v) = value.as_double() else { return };
        let strength = map_forward(v, 0.0, STRENGTH_MAX);
        match index {
            0 => {
                if strength != self.spatial {
                    self.spatial = strength;
                    if strength > 0.0 {
                        self.coef_spatial = precalc_coefs(strength);
                    }
                    debug!(spatial = strength, "rebuilt spatial table");
                }
            }
            1 => {
                if strength != self.temporal {
                    self.temporal = strength;
                    if strength > 0.0 {
                        self.coef_temporal = precalc_coefs(strength);
                    }
                    debug!(temporal = strength, "rebuilt temporal table");
                }
            }
            _ => {}
        }
    }

    fn get_param(&self, index: usize) -> Option<ParamValue> {
        match index {
            0 => Some(ParamValue::Double(map_backward(
                self.spatial,
                0.0,
                STRENGTH_MAX,
            ))),
            1 => Some(ParamValue::Double(map_backward(
                self.temporal,
                0.0,
                STRENGTH_MAX,
            ))),
            _ => None,
        }
    }

    fn process(&mut self, _time: f64, input: &[u32], output: &mut [u32]) -> Result<()> {
        check_frame_len(input.len(), self.width, self.height)?;
        check_frame_len(output.len(), self.width, self.height)?;

        if self.spatial <= 0.0 && self.temporal <= 0.0 {
            output.copy_from_slice(input);
            return Ok(());
        }

        for (out, inp) in output.iter_mut().zip(input.iter()) {
            *out = inp & ALPHA_MASK;
        }

        for ch in 0..CHANNELS {
            let shift = 8 * ch as u32;
            for (s, px) in self.plane_in.iter_mut().zip(input.iter()) {
                *s = ((px >> shift) & 0xFF) as u8;
            }
            // history starts as the first frame seen, so the temporal pass
            // is an exact identity until something actually changes
            let plane_in = &self.plane_in;
            let prev = self.prev[ch]
                .get_or_insert_with(|| plane_in.iter().map(|&v| (v as u16) << 8).collect());

            match (self.spatial > 0.0, self.temporal > 0.0) {
                (true, true) => denoise_combined(
                    &self.plane_in,
                    &mut self.plane_out,
                    &mut self.line,
                    prev,
                    self.width,
                    self.height,
                    &self.coef_spatial,
                    &self.coef_temporal,
                ),
                (true, false) => denoise_spatial(
                    &self.plane_in,
                    &mut self.plane_out,
                    &mut self.line,
                    self.width,
                    self.height,
                    &self.coef_spatial,
                ),
                (false, true) => {
                    denoise_temporal(&self.plane_in, &mut self.plane_out, prev, &self.coef_temporal)
                }
                (false, false) => unreachable!(),
            }

            for (out, &v) in output.iter_mut().zip(self.plane_out.iter()) {
                *out |= (v as u32) << shift;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_strength_is_identity() {
        let mut dn = Denoise3d::new(8, 8).unwrap();
        dn.set_param(0, &ParamValue::Double(0.0));
        dn.set_param(1, &ParamValue::Double(0.0));
        let input: Vec<u32> = (0..64).map(|i| 0x4000_0000 | (i as u32 * 0x0305_0701)).collect();
        let mut output = vec![0u32; 64];
        dn.process(0.0, &input, &mut output).unwrap();
        assert_eq!(input, output);
    }

    #[test]
    fn test_uniform_frame_unchanged() {
        let mut dn = Denoise3d::new(16, 16).unwrap();
        let input = vec![0xFF80_8080u32; 256];
        let mut output = vec![0u32; 256];
        dn.process(0.0, &input, &mut output).unwrap();
        assert_eq!(input, output);
    }

    #[test]
    fn test_spatial_pass_reduces_noise() {
        let mut dn = Denoise3d::new(32, 32).unwrap();
        dn.set_param(1, &ParamValue::Double(0.0));
        // checkerboard wobble of +/-3 around 128 on the red channel
        let input: Vec<u32> = (0..1024)
            .map(|i| {
                let x = i % 32;
                let y = i / 32;
                let v = if (x + y) % 2 == 0 { 131u32 } else { 125 };
                0xFF00_0000 | v
            })
            .collect();
        let mut output = vec![0u32; 1024];
        dn.process(0.0, &input, &mut output).unwrap();

        let spread = |f: &[u32]| {
            let vals: Vec<i32> = f.iter().map(|&p| (p & 0xFF) as i32).collect();
            let mean = vals.iter().sum::<i32>() as f64 / vals.len() as f64;
            vals.iter().map(|&v| (v as f64 - mean).abs()).sum::<f64>() / vals.len() as f64
        };
        assert!(spread(&output) < spread(&input), "noise not reduced");
    }

    #[test]
    fn test_temporal_first_frame_is_identity() {
        let mut dn = Denoise3d::new(8, 8).unwrap();
        dn.set_param(0, &ParamValue::Double(0.0));
        let input: Vec<u32> = (0..64).map(|i| 0xFF00_0000 | (i as u32 * 4)).collect();
        let mut output = vec![0u32; 64];
        dn.process(0.0, &input, &mut output).unwrap();
        assert_eq!(input, output);
    }

    #[test]
    fn test_temporal_pass_follows_changes_slowly() {
        let mut dn = Denoise3d::new(8, 8).unwrap();
        dn.set_param(0, &ParamValue::Double(0.0));
        let dark = vec![0xFF00_0064u32; 64];
        let bright = vec![0xFF00_006Au32; 64];
        let mut output = vec![0u32; 64];
        dn.process(0.0, &dark, &mut output).unwrap();
        dn.process(1.0 / 25.0, &bright, &mut output).unwrap();
        let v = output[0] & 0xFF;
        // landed strictly between the two frames
        assert!(v > 0x64 && v < 0x6A, "v = {:#x}", v);
    }

    #[test]
    fn test_alpha_passthrough() {
        let mut dn = Denoise3d::new(8, 8).unwrap();
        let input: Vec<u32> = (0..64).map(|i| (i as u32) << 24 | 0x0080_4020).collect();
        let mut output = vec![0u32; 64];
        dn.process(0.0, &input, &mut output).unwrap();
        for (inp, out) in input.iter().zip(output.iter()) {
            assert_eq!(inp & ALPHA_MASK, out & ALPHA_MASK);
        }
    }

    #[test]
    fn test_lut_center_is_zero() {
        let ct = precalc_coefs(4.0);
        assert_eq!(ct[LUT_CENTER as usize], 0);
        // odd symmetry around the center
        for d in [1, 16, 160, 1600] {
            assert_eq!(
                ct[(LUT_CENTER + d) as usize],
                -ct[(LUT_CENTER - d) as usize]
            );
        }
    }
}
