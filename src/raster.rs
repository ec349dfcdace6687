// ============================================================================
// RASTER IMAGE — owned pixel buffer with bulk and random-access views
// ============================================================================
//
// Two ways in:
//   * bulk view   — raw bytes in physical channel order, rows `stride` apart
//   * get/set     — one pixel per call, normalized to R, G, B, A
//
// Decoded images use the device-bitmap layout (B, G, R[, A], rows padded to a
// 4-byte boundary), so the two views disagree on channel order. The filter
// primitives depend on that distinction.
// ============================================================================

use image::{Rgba, RgbImage, RgbaImage};

use crate::error::RasterError;

/// Row alignment used for decoded images.
pub const ROW_ALIGN: usize = 4;

/// Channel count and physical byte order of one pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgb8,
    Rgba8,
    Bgr8,
    Bgra8,
}

impl PixelFormat {
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 | PixelFormat::Bgr8 => 3,
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
        }
    }

    #[inline]
    pub fn has_alpha(self) -> bool {
        matches!(self, PixelFormat::Rgba8 | PixelFormat::Bgra8)
    }

    /// Byte offsets of the R, G and B channels inside one pixel.
    #[inline]
    fn rgb_offsets(self) -> [usize; 3] {
        match self {
            PixelFormat::Rgb8 | PixelFormat::Rgba8 => [0, 1, 2],
            PixelFormat::Bgr8 | PixelFormat::Bgra8 => [2, 1, 0],
        }
    }
}

/// Width × pixel size rounded up to [`ROW_ALIGN`].
pub fn device_stride(width: u32, format: PixelFormat) -> usize {
    let row = width as usize * format.bytes_per_pixel();
    row.div_ceil(ROW_ALIGN) * ROW_ALIGN
}

// ============================================================================
// RasterImage
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    format: PixelFormat,
    stride: usize,
    data: Vec<u8>,
}

impl RasterImage {
    // ---- construction -------------------------------------------------------

    /// Zero-filled image with packed rows.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = width as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            stride,
            data: vec![0; stride * height as usize],
        }
    }

    /// Zero-filled image with an explicit row stride (padding bytes included).
    pub fn with_stride(
        width: u32,
        height: u32,
        format: PixelFormat,
        stride: usize,
    ) -> Result<Self, RasterError> {
        check_stride(width, format, stride)?;
        Ok(Self {
            width,
            height,
            format,
            stride,
            data: vec![0; stride * height as usize],
        })
    }

    /// Wrap an existing buffer. `data` must hold at least `stride * height` bytes.
    pub fn from_raw(
        width: u32,
        height: u32,
        format: PixelFormat,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self, RasterError> {
        check_stride(width, format, stride)?;
        let expected = stride * height as usize;
        if data.len() < expected {
            return Err(RasterError::BufferTooSmall { expected, actual: data.len() });
        }
        Ok(Self { width, height, format, stride, data })
    }

    /// Convert a decoded RGBA image into the device layout (BGRA, aligned rows).
    pub fn from_rgba_image(src: &RgbaImage) -> Self {
        let format = PixelFormat::Bgra8;
        let (w, h) = src.dimensions();
        let stride = device_stride(w, format);
        let mut data = vec![0u8; stride * h as usize];
        let src_row = w as usize * 4;
        if src_row > 0 {
            for (row_out, row_in) in data.chunks_mut(stride).zip(src.as_raw().chunks(src_row)) {
                for (o, i) in row_out.chunks_exact_mut(4).zip(row_in.chunks_exact(4)) {
                    o[0] = i[2];
                    o[1] = i[1];
                    o[2] = i[0];
                    o[3] = i[3];
                }
            }
        }
        Self { width: w, height: h, format, stride, data }
    }

    /// Convert a decoded RGB image into the device layout (BGR, aligned rows).
    pub fn from_rgb_image(src: &RgbImage) -> Self {
        let format = PixelFormat::Bgr8;
        let (w, h) = src.dimensions();
        let stride = device_stride(w, format);
        let mut data = vec![0u8; stride * h as usize];
        let src_row = w as usize * 3;
        if src_row > 0 {
            for (row_out, row_in) in data.chunks_mut(stride).zip(src.as_raw().chunks(src_row)) {
                for (o, i) in row_out.chunks_exact_mut(3).zip(row_in.chunks_exact(3)) {
                    o[0] = i[2];
                    o[1] = i[1];
                    o[2] = i[0];
                }
            }
        }
        Self { width: w, height: h, format, stride, data }
    }

    // ---- accessors ----------------------------------------------------------

    #[inline]
    pub fn width(&self) -> u32 { self.width }

    #[inline]
    pub fn height(&self) -> u32 { self.height }

    #[inline]
    pub fn format(&self) -> PixelFormat { self.format }

    #[inline]
    pub fn stride(&self) -> usize { self.stride }

    #[inline]
    pub fn pixel_size(&self) -> usize { self.format.bytes_per_pixel() }

    /// The whole backing buffer, padding included.
    pub fn as_raw(&self) -> &[u8] { &self.data }

    // ---- bulk view ----------------------------------------------------------

    pub fn as_bulk_view(&self) -> BulkView<'_> {
        BulkView {
            bytes: &self.data,
            stride: self.stride,
            pixel_size: self.pixel_size(),
            row_bytes: self.width as usize * self.pixel_size(),
            height: self.height as usize,
        }
    }

    pub fn as_bulk_view_mut(&mut self) -> BulkViewMut<'_> {
        let pixel_size = self.pixel_size();
        BulkViewMut {
            row_bytes: self.width as usize * pixel_size,
            bytes: &mut self.data,
            stride: self.stride,
            pixel_size,
            height: self.height as usize,
        }
    }

    // ---- random access ------------------------------------------------------

    #[inline]
    fn offset(&self, x: u32, y: u32) -> Result<usize, RasterError> {
        if x >= self.width || y >= self.height {
            return Err(RasterError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y as usize * self.stride + x as usize * self.pixel_size())
    }

    /// Read one pixel as R, G, B, A. Alpha is 255 for formats without alpha.
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<Rgba<u8>, RasterError> {
        let i = self.offset(x, y)?;
        let [ro, go, bo] = self.format.rgb_offsets();
        let px = &self.data[i..i + self.pixel_size()];
        let a = if self.format.has_alpha() { px[3] } else { 255 };
        Ok(Rgba([px[ro], px[go], px[bo], a]))
    }

    /// Write one pixel given as R, G, B, A. Alpha is dropped for formats without it.
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Rgba<u8>) -> Result<(), RasterError> {
        let i = self.offset(x, y)?;
        let [ro, go, bo] = self.format.rgb_offsets();
        let has_alpha = self.format.has_alpha();
        let size = self.pixel_size();
        let px = &mut self.data[i..i + size];
        px[ro] = pixel[0];
        px[go] = pixel[1];
        px[bo] = pixel[2];
        if has_alpha {
            px[3] = pixel[3];
        }
        Ok(())
    }

    // ---- export -------------------------------------------------------------

    /// Normalized, packed RGBA copy for encoders.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut out = RgbaImage::new(self.width, self.height);
        let [ro, go, bo] = self.format.rgb_offsets();
        let has_alpha = self.format.has_alpha();
        let out_stride = self.width as usize * 4;
        if out_stride == 0 {
            return out;
        }
        let view = self.as_bulk_view();
        for (row_out, row_in) in out.chunks_mut(out_stride).zip(view.rows()) {
            for (o, i) in row_out.chunks_exact_mut(4).zip(row_in.chunks_exact(view.pixel_size)) {
                o[0] = i[ro];
                o[1] = i[go];
                o[2] = i[bo];
                o[3] = if has_alpha { i[3] } else { 255 };
            }
        }
        out
    }

    /// Normalized, packed RGB copy (alpha discarded).
    pub fn to_rgb_image(&self) -> RgbImage {
        let mut out = RgbImage::new(self.width, self.height);
        let [ro, go, bo] = self.format.rgb_offsets();
        let out_stride = self.width as usize * 3;
        if out_stride == 0 {
            return out;
        }
        let view = self.as_bulk_view();
        for (row_out, row_in) in out.chunks_mut(out_stride).zip(view.rows()) {
            for (o, i) in row_out.chunks_exact_mut(3).zip(row_in.chunks_exact(view.pixel_size)) {
                o[0] = i[ro];
                o[1] = i[go];
                o[2] = i[bo];
            }
        }
        out
    }
}

fn check_stride(width: u32, format: PixelFormat, stride: usize) -> Result<(), RasterError> {
    let row_bytes = width as usize * format.bytes_per_pixel();
    if stride < row_bytes {
        return Err(RasterError::InvalidStride { stride, row_bytes });
    }
    Ok(())
}

// ============================================================================
// Bulk views
// ============================================================================

/// Read-only linear view of the pixel bytes.
pub struct BulkView<'a> {
    pub bytes: &'a [u8],
    pub stride: usize,
    pub pixel_size: usize,
    row_bytes: usize,
    height: usize,
}

impl<'a> BulkView<'a> {
    /// Image bytes of each row, padding excluded.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        let row_bytes = self.row_bytes;
        self.bytes
            .chunks(self.stride.max(1))
            .take(self.height)
            .map(move |r| &r[..row_bytes])
    }
}

/// Mutable linear view of the pixel bytes.
pub struct BulkViewMut<'a> {
    pub bytes: &'a mut [u8],
    pub stride: usize,
    pub pixel_size: usize,
    row_bytes: usize,
    height: usize,
}

impl BulkViewMut<'_> {
    /// Image bytes of each row, padding excluded.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> + '_ {
        let row_bytes = self.row_bytes;
        self.bytes
            .chunks_mut(self.stride.max(1))
            .take(self.height)
            .map(move |r| &mut r[..row_bytes])
    }
}
