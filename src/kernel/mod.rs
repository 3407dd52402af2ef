//! Separable recursive (IIR) spatial filter kernels
//!
//! The core of every smoothing effect in this crate: a second-order
//! recursive filter run over each color plane in four directions
//! (left→right, right→left, top→bottom, bottom→top), with boundary
//! seeding that avoids dark halos at the frame edges.
//!
//! Layering, leaves first:
//!
//! - [`coeffs`]: biquad coefficient derivation and the trailing-edge
//!   compensation tap solve
//! - [`line`]: the forward/backward recursion over one 1-D sequence
//! - [`plane`]: four directional passes over a full 2-D plane
//! - [`frame`]: packed pixels ↔ planes, clamping, alpha pass-through

pub mod coeffs;
pub mod frame;
pub mod line;
pub mod plane;

pub use coeffs::{Biquad, EdgeTaps};
pub use frame::FrameSmoother;
pub use plane::{Plane, PlaneFilter};

/// Number of boundary samples averaged for edge compensation
///
/// Clamped to half the line length for short lines.
pub const EDGE_AVG: usize = 8;
