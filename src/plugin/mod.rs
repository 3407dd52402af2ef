//! Generic effect-plugin interface
//!
//! Every video effect in this crate is a plain struct implementing the
//! [`Effect`] trait. The trait mirrors the lifecycle a host application
//! drives: query static metadata, construct an instance for a fixed frame
//! size, get/set named parameters, process frames, drop the instance.
//!
//! Parameter setters clamp out-of-range values instead of returning errors;
//! the host-facing contract has no error path for parameter updates.

pub mod params;

use crate::error::{Error, Result};

/// Kind of plugin, as reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginType {
    /// One input, one output
    Filter,
    /// No input, one output
    Source,
    /// Two inputs, one output
    Mixer2,
    /// Three inputs, one output
    Mixer3,
}

/// Packed-pixel layout accepted by an effect
///
/// Frames are `u32` words; the alpha channel always occupies the most
/// significant byte, the three color channels the remaining bytes in the
/// order the model names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModel {
    /// Red in the least significant byte
    Rgba8888,
    /// Blue in the least significant byte
    Bgra8888,
    /// Channel order irrelevant to the effect
    Packed32,
}

/// Static plugin metadata
#[derive(Debug, Clone)]
pub struct PluginInfo {
    /// Display name
    pub name: &'static str,
    /// Author credit
    pub author: &'static str,
    /// Plugin kind
    pub plugin_type: PluginType,
    /// Accepted pixel layout
    pub color_model: ColorModel,
    /// Major version of the effect
    pub major_version: u32,
    /// Minor version of the effect
    pub minor_version: u32,
    /// Human-readable explanation
    pub explanation: &'static str,
}

/// Declared type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Double in [0, 1]
    Double,
    /// Boolean
    Bool,
    /// RGB color
    Color,
    /// Normalized 2-D position
    Position,
    /// UTF-8 string
    Str,
}

/// Per-parameter metadata
#[derive(Debug, Clone)]
pub struct ParamInfo {
    /// Parameter name
    pub name: &'static str,
    /// Declared type
    pub kind: ParamKind,
    /// Human-readable explanation
    pub explanation: &'static str,
}

/// RGB color parameter value, components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Normalized 2-D position parameter value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A typed parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Double(f64),
    Bool(bool),
    Color(Color),
    Position(Position),
    Str(String),
}

impl ParamValue {
    /// Interpret the value as a double, if possible
    ///
    /// Booleans marshal as 0.0 / 1.0, matching hosts that drive boolean
    /// parameters through the double channel.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            ParamValue::Double(v) => Some(*v),
            ParamValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Interpret the value as a boolean, if possible
    ///
    /// Doubles at or above 0.5 read as true.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            ParamValue::Double(v) => Some(*v >= 0.5),
            _ => None,
        }
    }
}

/// A video effect instance bound to a fixed frame size
///
/// `process` must be pure with respect to instance parameters: the same
/// input and the same parameter state produce the same output. Instances
/// are not synchronized; a host calling from multiple threads must use one
/// instance per thread or serialize calls.
pub trait Effect: Sized {
    /// Static plugin metadata
    fn info() -> PluginInfo;

    /// Declared parameters, in index order
    fn params() -> &'static [ParamInfo];

    /// Construct an instance for the given frame size
    ///
    /// Allocates all per-instance scratch sized to `width * height`.
    /// Fails only on invalid dimensions or allocation problems; a failed
    /// construction must not be used.
    fn new(width: usize, height: usize) -> Result<Self>;

    /// Set a parameter by index, clamping out-of-domain values
    ///
    /// Unknown indices and mistyped values are ignored.
    fn set_param(&mut self, index: usize, value: &ParamValue);

    /// Read back a parameter by index
    fn get_param(&self, index: usize) -> Option<ParamValue>;

    /// Transform one frame
    ///
    /// `input` and `output` are packed-pixel buffers of exactly
    /// `width * height` words and must not alias. The output is fully
    /// overwritten.
    fn process(&mut self, time: f64, input: &[u32], output: &mut [u32]) -> Result<()>;

    /// Two-input mixer variant; unsupported by plain filters
    fn process2(
        &mut self,
        _time: f64,
        _input1: &[u32],
        _input2: &[u32],
        _output: &mut [u32],
    ) -> Result<()> {
        Err(Error::unsupported("two-input processing"))
    }

    /// Three-input mixer variant; unsupported by plain filters
    fn process3(
        &mut self,
        _time: f64,
        _input1: &[u32],
        _input2: &[u32],
        _input3: &[u32],
        _output: &mut [u32],
    ) -> Result<()> {
        Err(Error::unsupported("three-input processing"))
    }
}

/// Check that a packed frame buffer matches the instance dimensions
pub(crate) fn check_frame_len(len: usize, width: usize, height: usize) -> Result<()> {
    let need = width * height;
    if len < need {
        return Err(Error::BufferTooSmall { need, have: len });
    }
    if len > need {
        return Err(Error::invalid_input(format!(
            "frame buffer holds {} pixels, instance is {}x{}",
            len, width, height
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_value_as_double() {
        assert_eq!(ParamValue::Double(0.25).as_double(), Some(0.25));
        assert_eq!(ParamValue::Bool(true).as_double(), Some(1.0));
        assert_eq!(ParamValue::Str("x".into()).as_double(), None);
    }

    #[test]
    fn test_param_value_as_bool() {
        assert_eq!(ParamValue::Bool(false).as_bool(), Some(false));
        assert_eq!(ParamValue::Double(0.7).as_bool(), Some(true));
        assert_eq!(ParamValue::Double(0.2).as_bool(), Some(false));
    }

    #[test]
    fn test_check_frame_len() {
        assert!(check_frame_len(12, 4, 3).is_ok());
        assert!(check_frame_len(11, 4, 3).is_err());
        assert!(check_frame_len(13, 4, 3).is_err());
    }
}
