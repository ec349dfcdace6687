//! Error types shared across the engine.
//!
//! Decoding failures abort session creation, encoding failures leave the
//! session untouched, and raster errors only surface from the random-access
//! pixel accessors.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a file into a [`RasterImage`](crate::raster::RasterImage).
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The path does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file is readable but is not JPEG, PNG, BMP or GIF.
    #[error("unsupported image format: {0}")]
    Unsupported(String),

    /// The container was recognized but its contents could not be decoded.
    #[error("corrupt image data: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to write the current image to disk.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Permissions, missing directory, disk full, ...
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The encoder rejected the pixel data.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl From<image::ImageError> for EncodeError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => EncodeError::Io(io),
            other => EncodeError::Encoding(other.to_string()),
        }
    }
}

/// Errors raised by the pixel buffer itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RasterError {
    /// Random access outside `[0, width) x [0, height)`.
    #[error("pixel ({x}, {y}) is outside the {width}x{height} image")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },

    /// Row stride shorter than one row of pixels.
    #[error("stride {stride} is smaller than the row size {row_bytes}")]
    InvalidStride { stride: usize, row_bytes: usize },

    /// Backing buffer shorter than `stride * height`.
    #[error("buffer holds {actual} bytes, {expected} required")]
    BufferTooSmall { expected: usize, actual: usize },
}

/// Errors for reading and writing adjustment preset files.
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("invalid preset file: {0}")]
    InvalidFormat(String),
}

impl From<Box<bincode::ErrorKind>> for PresetError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        PresetError::Serialize(e.to_string())
    }
}
