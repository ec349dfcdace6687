// ============================================================================
// ADJUSTMENT PRIMITIVES — grayscale, brightness, contrast
// ============================================================================
//
// Every adjustment exists twice:
//   * `_fast` walks the bulk view row by row, a tight loop over raw bytes in
//     physical channel order. Row padding is never touched.
//   * `_slow` goes through get_pixel / set_pixel once per coordinate. It is
//     deliberately naive and must stay that way: it is the baseline the fast
//     path is measured against.
//
// All functions mutate a buffer the pipeline already copied from the original.
// Brightness and contrast are bit-identical between the two paths. Grayscale
// is not: the fast path weights the bulk bytes (B, G, R on device layout)
// with 0.11 / 0.59 / 0.30, the slow path weights normalized R, G, B with
// 0.30 / 0.59 / 0.11. On BGR(A) images both give the same luma, on RGB(A)
// buffers they diverge.
// ============================================================================

use image::Rgba;

use crate::error::RasterError;
use crate::log_err;
use crate::raster::RasterImage;

/// Weights applied to bulk bytes 0, 1, 2 by [`grayscale_fast`].
pub const FAST_GRAY_WEIGHTS: [f64; 3] = [0.11, 0.59, 0.3];

/// Weights applied to R, G, B by [`grayscale_slow`].
pub const SLOW_GRAY_WEIGHTS: [f64; 3] = [0.3, 0.59, 0.11];

// ============================================================================
// Per-channel math shared by both paths
// ============================================================================

#[inline]
fn brightness_channel(value: u8, brightness: i32) -> u8 {
    (value as i32 + brightness).clamp(0, 255) as u8
}

/// `contrast` is the already squared factor.
#[inline]
fn contrast_channel(value: u8, contrast: f32) -> u8 {
    let mut v = value as f32 / 255.0;
    v -= 0.5;
    v *= contrast;
    v += 0.5;
    v *= 255.0;
    v.clamp(0.0, 255.0) as u8
}

/// Unwrap a random-access result inside a filter loop. The loops only visit
/// `x < width, y < height`, so an error here is a bug in the loop itself.
fn in_bounds<T>(result: Result<T, RasterError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            debug_assert!(false, "slow filter left the image: {e}");
            log_err!("slow filter left the image: {}", e);
            None
        }
    }
}

// ============================================================================
// GRAYSCALE
// ============================================================================

/// Bulk grayscale: `gray = 0.11*b0 + 0.59*b1 + 0.30*b2`, written to b0..b2.
pub fn grayscale_fast(image: &mut RasterImage) {
    let [w0, w1, w2] = FAST_GRAY_WEIGHTS;
    let mut view = image.as_bulk_view_mut();
    let pixel_size = view.pixel_size;
    for row in view.rows_mut() {
        for px in row.chunks_exact_mut(pixel_size) {
            let gray = (px[0] as f64 * w0 + px[1] as f64 * w1 + px[2] as f64 * w2) as u8;
            px[0] = gray;
            px[1] = gray;
            px[2] = gray;
        }
    }
}

/// Per-pixel grayscale: `gray = 0.30*R + 0.59*G + 0.11*B`, alpha kept.
pub fn grayscale_slow(image: &mut RasterImage) {
    let [wr, wg, wb] = SLOW_GRAY_WEIGHTS;
    for y in 0..image.height() {
        for x in 0..image.width() {
            let Some(pixel) = in_bounds(image.get_pixel(x, y)) else { continue };
            let gray = (pixel[0] as f64 * wr + pixel[1] as f64 * wg + pixel[2] as f64 * wb) as u8;
            in_bounds(image.set_pixel(x, y, Rgba([gray, gray, gray, pixel[3]])));
        }
    }
}

// ============================================================================
// BRIGHTNESS
// ============================================================================

/// Bulk brightness: adds `brightness` to the first three bytes of each pixel.
pub fn brightness_fast(image: &mut RasterImage, brightness: i32) {
    let mut view = image.as_bulk_view_mut();
    let pixel_size = view.pixel_size;
    for row in view.rows_mut() {
        for px in row.chunks_exact_mut(pixel_size) {
            for c in &mut px[..3] {
                *c = brightness_channel(*c, brightness);
            }
        }
    }
}

pub fn brightness_slow(image: &mut RasterImage, brightness: i32) {
    for y in 0..image.height() {
        for x in 0..image.width() {
            let Some(pixel) = in_bounds(image.get_pixel(x, y)) else { continue };
            let r = brightness_channel(pixel[0], brightness);
            let g = brightness_channel(pixel[1], brightness);
            let b = brightness_channel(pixel[2], brightness);
            in_bounds(image.set_pixel(x, y, Rgba([r, g, b, pixel[3]])));
        }
    }
}

// ============================================================================
// CONTRAST
// ============================================================================

/// Bulk contrast. `factor` is the nominal factor (`1 + slider/100`); it is
/// squared before use.
pub fn contrast_fast(image: &mut RasterImage, factor: f32) {
    let contrast = factor * factor;
    let mut view = image.as_bulk_view_mut();
    let pixel_size = view.pixel_size;
    for row in view.rows_mut() {
        for px in row.chunks_exact_mut(pixel_size) {
            for c in &mut px[..3] {
                *c = contrast_channel(*c, contrast);
            }
        }
    }
}

pub fn contrast_slow(image: &mut RasterImage, factor: f32) {
    let contrast = factor * factor;
    for y in 0..image.height() {
        for x in 0..image.width() {
            let Some(pixel) = in_bounds(image.get_pixel(x, y)) else { continue };
            let r = contrast_channel(pixel[0], contrast);
            let g = contrast_channel(pixel[1], contrast);
            let b = contrast_channel(pixel[2], contrast);
            in_bounds(image.set_pixel(x, y, Rgba([r, g, b, pixel[3]])));
        }
    }
}
