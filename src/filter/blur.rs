//! Recursive low-pass blur
//!
//! Smooths each color channel with the four-direction recursive filter from
//! [`crate::kernel`]. The visible control is a single blur amount; cutoff
//! frequency and quality factor are interpolated from a calibration table so
//! one knob covers everything from a sub-pixel soften to a heavy wash while
//! the response stays close to Gaussian across the whole range.

use tracing::debug;

use crate::error::Result;
use crate::kernel::{Biquad, FrameSmoother, PlaneFilter};
use crate::plugin::params::{map_backward_log, map_forward_log};
use crate::plugin::{
    check_frame_len, ColorModel, Effect, ParamInfo, ParamKind, ParamValue, PluginInfo, PluginType,
};

/// Working range of the blur amount, in table units
const AMOUNT_MIN: f64 = 0.5;
const AMOUNT_MAX: f64 = 100.0;

/// Calibration table: blur amount versus low-pass cutoff and quality.
/// Measured against a reference Gaussian at each listed amount; values
/// between rows are interpolated.
const AMOUNT_TABLE: [f32; 19] = [
    0.499_999, 0.7, 1.0, 1.5, 2.0, 3.0, 4.0, 5.0, 7.0, 10.0, 15.0, 20.0, 30.0, 40.0, 50.0, 70.0,
    100.0, 150.0, 200.000_01,
];
const CUTOFF_TABLE: [f32; 19] = [
    0.475, 0.39, 0.325, 0.26, 0.21, 0.155, 0.112, 0.0905, 0.065, 0.0458, 0.031, 0.0234, 0.015_75,
    0.0118, 0.0093, 0.007_25, 0.005_05, 0.0033, 0.0025,
];
const Q_TABLE: [f32; 19] = [
    0.53, 0.53, 0.54, 0.54, 0.54, 0.55, 0.6, 0.6, 0.6, 0.6, 0.6, 0.6, 0.6, 0.6, 0.6, 0.6, 0.6,
    0.6, 0.6,
];

/// Four-point Aitken-Neville interpolation over a table of breakpoints
///
/// `xs` must be strictly increasing; `x` is clamped to its span, so the
/// result never extrapolates past the table ends.
fn interpolate(xs: &[f32], ys: &[f32], x: f32) -> f32 {
    let t = xs.len();
    let x = x.clamp(xs[0], xs[t - 1]);
    let m = xs.iter().position(|&k| x <= k).unwrap_or(t - 1);
    let m = m.saturating_sub(2).min(t - 4);

    let mut p = [ys[m], ys[m + 1], ys[m + 2], ys[m + 3]];
    for j in 1..4 {
        for i in (j..4).rev() {
            p[i] += (x - xs[i + m]) / (xs[i + m] - xs[i - j + m]) * (p[i] - p[i - 1]);
        }
    }
    p[3]
}

/// Infinite-impulse-response blur effect
#[derive(Debug, Clone)]
pub struct IirBlur {
    width: usize,
    height: usize,
    amount: f64,
    edge_comp: bool,
    filter: PlaneFilter,
    smoother: FrameSmoother,
}

impl IirBlur {
    /// Coefficients currently driving the smoothing passes
    pub fn coeffs(&self) -> &Biquad {
        self.filter.coeffs()
    }

    /// Rebuild the plane filter for the current amount
    fn rederive(&mut self) {
        let f = interpolate(&AMOUNT_TABLE, &CUTOFF_TABLE, self.amount as f32)
            .clamp(1e-4, 0.4999);
        let q = interpolate(&AMOUNT_TABLE, &Q_TABLE, self.amount as f32).max(0.1);
        let bq = Biquad::lowpass(f, q);
        debug!(
            amount = self.amount,
            cutoff = f,
            q,
            a1 = bq.a1,
            a2 = bq.a2,
            "rederived blur coefficients"
        );
        self.filter = PlaneFilter::new(bq);
    }
}

impl Effect for IirBlur {
    fn info() -> PluginInfo {
        PluginInfo {
            name: "IIR blur",
            author: "quadfilt",
            plugin_type: PluginType::Filter,
            color_model: ColorModel::Rgba8888,
            major_version: 1,
            minor_version: 1,
            explanation: "Edge compensated recursive low-pass blur",
        }
    }

    fn params() -> &'static [ParamInfo] {
        &[
            ParamInfo {
                name: "Amount",
                kind: ParamKind::Double,
                explanation: "Amount of blur",
            },
            ParamInfo {
                name: "Edge",
                kind: ParamKind::Bool,
                explanation: "Edge compensation",
            },
        ]
    }

    fn new(width: usize, height: usize) -> Result<IirBlur> {
        let mut blur = IirBlur {
            width,
            height,
            amount: map_forward_log(0.2, AMOUNT_MIN, AMOUNT_MAX),
            edge_comp: true,
            filter: PlaneFilter::new(Biquad::lowpass(0.25, 0.6)),
            smoother: FrameSmoother::new(width, height),
        };
        blur.rederive();
        Ok(blur)
    }

    fn set_param(&mut self, index: usize, value: &ParamValue) {
        match index {
            0 => {
                if let Some(v) = value.as_double() {
                    // the bottom of the slider switches the effect off
                    // entirely rather than leaving a residual soften
                    let amount = if v <= 0.0 {
                        0.0
                    } else {
                        map_forward_log(v, AMOUNT_MIN, AMOUNT_MAX)
                    };
                    if amount != self.amount {
                        self.amount = amount;
                        if amount > 0.0 {
                            self.rederive();
                        }
                    }
                }
            }
            1 => {
                if let Some(b) = value.as_bool() {
                    self.edge_comp = b;
                }
            }
            _ => {}
        }
    }

    fn get_param(&self, index: usize) -> Option<ParamValue> {
        match index {
            0 => Some(ParamValue::Double(if self.amount <= 0.0 {
                0.0
            } else {
                map_backward_log(self.amount, AMOUNT_MIN, AMOUNT_MAX)
            })),
            1 => Some(ParamValue::Bool(self.edge_comp)),
            _ => None,
        }
    }

    fn process(&mut self, _time: f64, input: &[u32], output: &mut [u32]) -> Result<()> {
        if self.amount <= 0.0 {
            check_frame_len(input.len(), self.width, self.height)?;
            check_frame_len(output.len(), self.width, self.height)?;
            output.copy_from_slice(input);
            return Ok(());
        }
        self.smoother.process(
            input,
            output,
            [&self.filter, &self.filter, &self.filter],
            self.edge_comp,
        )
    }
}
