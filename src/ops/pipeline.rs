// ============================================================================
// ADJUSTMENT PIPELINE — state + pure re-render from the original
// ============================================================================
//
// A render never looks at the previous result: it clones the untouched
// original and applies, in this order,
//     grayscale -> contrast -> brightness
// skipping every adjustment whose parameter is the identity value.
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::log_warn;
use crate::raster::RasterImage;

use super::strategy::AdjustmentStrategy;

pub const BRIGHTNESS_MIN: i32 = -255;
pub const BRIGHTNESS_MAX: i32 = 255;
pub const CONTRAST_MIN: i32 = -100;
pub const CONTRAST_MAX: i32 = 100;

/// Current slider / toggle values. `Default` is the identity transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdjustmentState {
    pub grayscale: bool,
    /// Additive offset, `BRIGHTNESS_MIN..=BRIGHTNESS_MAX`.
    pub brightness: i32,
    /// Contrast slider, `CONTRAST_MIN..=CONTRAST_MAX`.
    pub contrast: i32,
}

impl AdjustmentState {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn is_identity(&self) -> bool {
        !self.grayscale && self.brightness == 0 && self.contrast == 0
    }

    /// Nominal contrast factor `1 + slider/100` (the filters square it).
    pub fn contrast_factor(&self) -> f32 {
        1.0 + self.contrast as f32 / 100.0
    }

    pub fn set_brightness(&mut self, value: i32) {
        self.brightness = clamp_logged("brightness", value, BRIGHTNESS_MIN, BRIGHTNESS_MAX);
    }

    pub fn set_contrast(&mut self, value: i32) {
        self.contrast = clamp_logged("contrast", value, CONTRAST_MIN, CONTRAST_MAX);
    }

    /// Copy with every field forced into range.
    pub fn clamped(mut self) -> Self {
        self.set_brightness(self.brightness);
        self.set_contrast(self.contrast);
        self
    }
}

fn clamp_logged(name: &str, value: i32, min: i32, max: i32) -> i32 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        log_warn!("{} {} out of range, clamped to {}", name, value, clamped);
    }
    clamped
}

/// Derive a new current image from `original`.
pub fn render(
    original: &RasterImage,
    state: &AdjustmentState,
    strategy: &dyn AdjustmentStrategy,
) -> RasterImage {
    let mut current = original.clone();

    if state.grayscale {
        strategy.grayscale(&mut current);
    }
    if state.contrast != 0 {
        strategy.contrast(&mut current, state.contrast_factor());
    }
    if state.brightness != 0 {
        strategy.brightness(&mut current, state.brightness);
    }

    current
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use image::Rgba;

    use super::*;
    use crate::ops::strategy::ProcessingStrategy;
    use crate::raster::PixelFormat;

    /// Records the order of filter calls without touching pixels.
    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<String>>,
    }

    impl AdjustmentStrategy for Recorder {
        fn grayscale(&self, _: &mut RasterImage) {
            self.calls.borrow_mut().push("grayscale".into());
        }
        fn brightness(&self, _: &mut RasterImage, brightness: i32) {
            self.calls.borrow_mut().push(format!("brightness({brightness})"));
        }
        fn contrast(&self, _: &mut RasterImage, factor: f32) {
            self.calls.borrow_mut().push(format!("contrast({factor})"));
        }
    }

    fn sample() -> RasterImage {
        let mut img = RasterImage::with_stride(3, 2, PixelFormat::Bgra8, 16).unwrap();
        for y in 0..2 {
            for x in 0..3 {
                let v = (x * 70 + y * 40) as u8;
                img.set_pixel(x, y, Rgba([v, v / 3, 255 - v, 180])).unwrap();
            }
        }
        img
    }

    #[test]
    fn identity_state_skips_every_filter() {
        let rec = Recorder::default();
        let original = sample();
        let out = render(&original, &AdjustmentState::identity(), &rec);
        assert!(rec.calls.borrow().is_empty());
        assert_eq!(out, original);
    }

    #[test]
    fn filters_run_in_fixed_order() {
        let rec = Recorder::default();
        let state = AdjustmentState { grayscale: true, brightness: -20, contrast: 50 };
        render(&sample(), &state, &rec);
        assert_eq!(
            *rec.calls.borrow(),
            vec!["grayscale", "contrast(1.5)", "brightness(-20)"]
        );
    }

    #[test]
    fn only_non_identity_filters_run() {
        let rec = Recorder::default();
        let state = AdjustmentState { grayscale: false, brightness: 0, contrast: -50 };
        render(&sample(), &state, &rec);
        assert_eq!(*rec.calls.borrow(), vec!["contrast(0.5)"]);
    }

    #[test]
    fn render_does_not_modify_original() {
        let original = sample();
        let snapshot = original.clone();
        let state = AdjustmentState { grayscale: true, brightness: 90, contrast: 100 };
        for &s in ProcessingStrategy::all() {
            let out = render(&original, &state, s.engine());
            assert_ne!(out, original);
        }
        assert_eq!(original, snapshot);
    }

    #[test]
    fn repeated_renders_are_identical() {
        let original = sample();
        let state = AdjustmentState { grayscale: true, brightness: 33, contrast: 17 };
        let engine = ProcessingStrategy::Fast.engine();
        let first = render(&original, &state, engine);
        for _ in 0..3 {
            assert_eq!(render(&original, &state, engine), first);
        }
    }

    #[test]
    fn brightness_and_contrast_agree_across_strategies() {
        let original = sample();
        let state = AdjustmentState { grayscale: false, brightness: 45, contrast: -30 };
        let fast = render(&original, &state, ProcessingStrategy::Fast.engine());
        let slow = render(&original, &state, ProcessingStrategy::Slow.engine());
        assert_eq!(fast, slow);
    }

    #[test]
    fn contrast_factor_follows_slider() {
        let mut state = AdjustmentState::identity();
        assert_eq!(state.contrast_factor(), 1.0);
        state.set_contrast(100);
        assert_eq!(state.contrast_factor(), 2.0);
        state.set_contrast(-100);
        assert_eq!(state.contrast_factor(), 0.0);
    }

    #[test]
    fn setters_clamp_into_range() {
        let mut state = AdjustmentState::identity();
        state.set_brightness(400);
        state.set_contrast(-101);
        assert_eq!(state.brightness, 255);
        assert_eq!(state.contrast, -100);

        let raw = AdjustmentState { grayscale: true, brightness: -300, contrast: 150 };
        assert_eq!(
            raw.clamped(),
            AdjustmentState { grayscale: true, brightness: -255, contrast: 100 }
        );
    }
}
