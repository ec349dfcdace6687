//! Processing strategies: which family of filter primitives a session uses.
//!
//! The strategy is chosen once when an image is opened and never changes for
//! that session. Both strategies expose the same three adjustments; only the
//! access pattern differs.

use std::fmt;
use std::str::FromStr;

use crate::raster::RasterImage;

use super::adjustments;

/// The three adjustments every strategy must provide.
pub trait AdjustmentStrategy {
    fn grayscale(&self, image: &mut RasterImage);
    fn brightness(&self, image: &mut RasterImage, brightness: i32);
    /// `factor` is the nominal contrast factor; implementations square it.
    fn contrast(&self, image: &mut RasterImage, factor: f32);
}

/// Bulk buffer access.
#[derive(Clone, Copy, Debug, Default)]
pub struct FastStrategy;

/// One get/set call per pixel.
#[derive(Clone, Copy, Debug, Default)]
pub struct SlowStrategy;

impl AdjustmentStrategy for FastStrategy {
    fn grayscale(&self, image: &mut RasterImage) {
        adjustments::grayscale_fast(image);
    }

    fn brightness(&self, image: &mut RasterImage, brightness: i32) {
        adjustments::brightness_fast(image, brightness);
    }

    fn contrast(&self, image: &mut RasterImage, factor: f32) {
        adjustments::contrast_fast(image, factor);
    }
}

impl AdjustmentStrategy for SlowStrategy {
    fn grayscale(&self, image: &mut RasterImage) {
        adjustments::grayscale_slow(image);
    }

    fn brightness(&self, image: &mut RasterImage, brightness: i32) {
        adjustments::brightness_slow(image, brightness);
    }

    fn contrast(&self, image: &mut RasterImage, factor: f32) {
        adjustments::contrast_slow(image, factor);
    }
}

/// Strategy selector picked at open time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ProcessingStrategy {
    #[default]
    Fast,
    Slow,
}

impl ProcessingStrategy {
    pub fn all() -> &'static [ProcessingStrategy] {
        &[ProcessingStrategy::Fast, ProcessingStrategy::Slow]
    }

    /// The implementation backing this selector.
    pub fn engine(self) -> &'static dyn AdjustmentStrategy {
        match self {
            ProcessingStrategy::Fast => &FastStrategy,
            ProcessingStrategy::Slow => &SlowStrategy,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProcessingStrategy::Fast => "fast",
            ProcessingStrategy::Slow => "slow",
        }
    }
}

impl fmt::Display for ProcessingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProcessingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" => Ok(ProcessingStrategy::Fast),
            "slow" => Ok(ProcessingStrategy::Slow),
            other => Err(format!("unknown processing strategy '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Fast".parse::<ProcessingStrategy>(), Ok(ProcessingStrategy::Fast));
        assert_eq!(" slow ".parse::<ProcessingStrategy>(), Ok(ProcessingStrategy::Slow));
        assert!("turbo".parse::<ProcessingStrategy>().is_err());
    }

    #[test]
    fn display_matches_parse() {
        for &s in ProcessingStrategy::all() {
            assert_eq!(s.to_string().parse::<ProcessingStrategy>(), Ok(s));
        }
    }
}
