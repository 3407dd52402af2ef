//! quadfilt - recursive and adaptive video filters for packed RGBA frames
//!
//! A small library of frame filters built around separable recursive
//! kernels: an edge-compensated IIR blur, a spatio-temporal denoiser and an
//! unsharp-mask sharpener. Every effect speaks the same host-facing
//! [`plugin::Effect`] interface: construct for a fixed frame size, drive
//! normalized parameters, process packed 32-bit frames.
//!
//! # Example
//!
//! ```no_run
//! use quadfilt::filter::IirBlur;
//! use quadfilt::plugin::{Effect, ParamValue};
//!
//! # fn main() -> quadfilt::Result<()> {
//! let mut blur = IirBlur::new(1920, 1080)?;
//! blur.set_param(0, &ParamValue::Double(0.4));
//!
//! let input = vec![0u32; 1920 * 1080];
//! let mut output = vec![0u32; 1920 * 1080];
//! blur.process(0.0, &input, &mut output)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod filter;
pub mod kernel;
pub mod plugin;

pub use error::{Error, Result};
pub use filter::{Denoise3d, IirBlur, Sharpness};
pub use plugin::Effect;

/// Library version from Cargo metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library initialization options
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Log at info level instead of warn
    pub verbose: bool,
    /// Log at debug level, overriding `verbose`
    pub debug: bool,
}

/// Initialize logging for hosts that do not install their own subscriber
///
/// `RUST_LOG` overrides the level chosen through [`Config`]. Calling this
/// twice fails; embedders with their own tracing setup should skip it
/// entirely.
pub fn init(config: Config) -> Result<()> {
    let level = if config.debug {
        "debug"
    } else if config.verbose {
        "info"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| Error::init(format!("failed to install tracing subscriber: {}", e)))?;

    tracing::debug!(version = VERSION, "{} initialized", NAME);
    Ok(())
}
