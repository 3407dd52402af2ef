//! Video effect filters
//!
//! Each submodule is one self-contained effect implementing
//! [`crate::plugin::Effect`]: construct for a frame size, set parameters,
//! process packed frames. All of them deinterleave to per-channel planes,
//! transform each channel independently and copy alpha through untouched.

pub mod blur;
pub mod denoise;
pub mod sharpness;

pub use blur::IirBlur;
pub use denoise::Denoise3d;
pub use sharpness::Sharpness;
