//! Image adjustment engine: grayscale, brightness and contrast over raster
//! images, each available as a fast bulk-buffer path and a slow per-pixel path.
//!
//! A [`Session`] owns one decoded original and the current adjusted image;
//! a [`Workspace`] holds any number of independent sessions.

pub mod cli;
pub mod error;
pub mod io;
pub mod logger;
pub mod ops;
pub mod raster;
pub mod session;
pub mod settings;
pub mod workspace;

pub use error::{DecodeError, EncodeError, PresetError, RasterError};
pub use io::SaveFormat;
pub use ops::{AdjustmentState, ProcessingStrategy};
pub use raster::{PixelFormat, RasterImage};
pub use session::Session;
pub use workspace::Workspace;
