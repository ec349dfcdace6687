use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageError, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError, PresetError};
use crate::ops::AdjustmentState;
use crate::raster::RasterImage;

/// Formats accepted by [`decode`].
pub const INPUT_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Bmp,
    ImageFormat::Gif,
];

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

// ============================================================================
// SAVE FORMAT
// ============================================================================

/// Formats the current image can be written as. GIF is decode-only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SaveFormat {
    #[default]
    Jpeg,
    Png,
    Bmp,
}

impl SaveFormat {
    pub fn all() -> &'static [SaveFormat] {
        &[SaveFormat::Jpeg, SaveFormat::Png, SaveFormat::Bmp]
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Png => "png",
            SaveFormat::Bmp => "bmp",
        }
    }

    pub fn from_extension(ext: &str) -> Option<SaveFormat> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(SaveFormat::Jpeg),
            "png" => Some(SaveFormat::Png),
            "bmp" => Some(SaveFormat::Bmp),
            _ => None,
        }
    }

    /// Pick the format from the target file's extension. Anything unrecognized
    /// is written as JPEG.
    pub fn from_path(path: &Path) -> SaveFormat {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(SaveFormat::from_extension)
            .unwrap_or(SaveFormat::Jpeg)
    }

    pub fn supports_quality(&self) -> bool {
        matches!(self, SaveFormat::Jpeg)
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveFormat::Jpeg => f.write_str("jpeg"),
            SaveFormat::Png => f.write_str("png"),
            SaveFormat::Bmp => f.write_str("bmp"),
        }
    }
}

impl FromStr for SaveFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SaveFormat::from_extension(s.trim())
            .ok_or_else(|| format!("unsupported save format '{}' (expected jpeg, png or bmp)", s))
    }
}

// ============================================================================
// DECODE
// ============================================================================

/// Decode a JPEG, PNG, BMP or GIF file into the device layout
/// (BGRA when the source carries alpha, BGR otherwise).
pub fn decode(path: &Path) -> Result<RasterImage, DecodeError> {
    if !path.exists() {
        return Err(DecodeError::NotFound(path.to_path_buf()));
    }

    let reader = image::io::Reader::open(path)?.with_guessed_format()?;
    let format = reader.format().ok_or_else(|| {
        DecodeError::Unsupported(format!("{}: unrecognized image data", path.display()))
    })?;
    if !INPUT_FORMATS.contains(&format) {
        return Err(DecodeError::Unsupported(format!("{:?}", format)));
    }

    let img = reader.decode().map_err(decode_error)?;
    let raster = if img.color().has_alpha() {
        RasterImage::from_rgba_image(&img.to_rgba8())
    } else {
        RasterImage::from_rgb_image(&img.to_rgb8())
    };
    Ok(raster)
}

fn decode_error(e: ImageError) -> DecodeError {
    match e {
        ImageError::Unsupported(u) => DecodeError::Unsupported(u.to_string()),
        ImageError::IoError(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            DecodeError::Corrupt(io.to_string())
        }
        ImageError::IoError(io) => DecodeError::Io(io),
        other => DecodeError::Corrupt(other.to_string()),
    }
}

// ============================================================================
// ENCODE
// ============================================================================

/// Encode `image` to `path` with the default JPEG quality.
pub fn encode(image: &RasterImage, path: &Path, format: SaveFormat) -> Result<(), EncodeError> {
    encode_with_quality(image, path, format, DEFAULT_JPEG_QUALITY)
}

/// Encode and write an image to a file. JPEG drops alpha; PNG and BMP keep it
/// when the image has an alpha channel.
///
/// The whole file is encoded in memory first, so an encoder failure leaves any
/// existing file at `path` untouched.
pub fn encode_with_quality(
    image: &RasterImage,
    path: &Path,
    format: SaveFormat,
    quality: u8,
) -> Result<(), EncodeError> {
    let bytes = encode_to_vec(image, format, quality)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn encode_to_vec(image: &RasterImage, format: SaveFormat, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    let (w, h) = (image.width(), image.height());
    let keep_alpha = image.format().has_alpha();

    match format {
        SaveFormat::Jpeg => {
            let rgb = image.to_rgb_image();
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
            encoder.encode(rgb.as_raw(), w, h, ColorType::Rgb8)?;
        }
        SaveFormat::Png => {
            let encoder = PngEncoder::new(&mut buf);
            if keep_alpha {
                encoder.write_image(image.to_rgba_image().as_raw(), w, h, ColorType::Rgba8)?;
            } else {
                encoder.write_image(image.to_rgb_image().as_raw(), w, h, ColorType::Rgb8)?;
            }
        }
        SaveFormat::Bmp => {
            let mut encoder = BmpEncoder::new(&mut buf);
            if keep_alpha {
                encoder.encode(image.to_rgba_image().as_raw(), w, h, ColorType::Rgba8)?;
            } else {
                encoder.encode(image.to_rgb_image().as_raw(), w, h, ColorType::Rgb8)?;
            }
        }
    }

    Ok(buf)
}

// ============================================================================
// ADJUSTMENT PRESETS (.iadj)
// ============================================================================

const PRESET_MAGIC_V1: &str = "IAD1";

/// Extension given to preset files written without one.
pub const PRESET_EXTENSION: &str = "iadj";

#[derive(Serialize, Deserialize)]
struct PresetFileV1 {
    magic: String,
    state: AdjustmentState,
}

/// Save adjustment values so they can be re-applied to other images.
pub fn save_preset(state: &AdjustmentState, path: &Path) -> Result<(), PresetError> {
    let preset = PresetFileV1 {
        magic: PRESET_MAGIC_V1.to_string(),
        state: *state,
    };
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, &preset)?;
    writer.flush()?;
    Ok(())
}

/// Load a preset. Out-of-range values are clamped.
pub fn load_preset(path: &Path) -> Result<AdjustmentState, PresetError> {
    let raw = std::fs::read(path)?;
    if raw.len() < 12 {
        return Err(PresetError::InvalidFormat("File too small".into()));
    }

    // bincode encodes a String as an 8-byte length prefix + UTF-8 data,
    // so bytes 8..12 hold the 4-char magic.
    let magic = std::str::from_utf8(&raw[8..12]).unwrap_or("");
    match magic {
        PRESET_MAGIC_V1 => {
            let preset: PresetFileV1 = bincode::deserialize(&raw)?;
            Ok(preset.state.clamped())
        }
        _ => Err(PresetError::InvalidFormat(format!("Unknown magic '{}'", magic))),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use image::{Rgba, RgbImage, RgbaImage};

    use super::*;
    use crate::raster::PixelFormat;

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("imgadjust_io_tests");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    fn checker(w: u32, h: u32) -> RasterImage {
        let src = RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([(x * 40) as u8, (y * 60) as u8, ((x + y) * 20) as u8])
        });
        RasterImage::from_rgb_image(&src)
    }

    #[test]
    fn save_format_from_path_defaults_to_jpeg() {
        assert_eq!(SaveFormat::from_path(Path::new("a/b.PNG")), SaveFormat::Png);
        assert_eq!(SaveFormat::from_path(Path::new("x.bmp")), SaveFormat::Bmp);
        assert_eq!(SaveFormat::from_path(Path::new("x.jpeg")), SaveFormat::Jpeg);
        assert_eq!(SaveFormat::from_path(Path::new("x.tiff")), SaveFormat::Jpeg);
        assert_eq!(SaveFormat::from_path(Path::new("noext")), SaveFormat::Jpeg);
    }

    #[test]
    fn save_format_parses_names() {
        assert_eq!("PNG".parse::<SaveFormat>(), Ok(SaveFormat::Png));
        assert_eq!("jpg".parse::<SaveFormat>(), Ok(SaveFormat::Jpeg));
        assert!("gif".parse::<SaveFormat>().is_err());
        for &f in SaveFormat::all() {
            assert_eq!(f.to_string().parse::<SaveFormat>(), Ok(f));
        }
    }

    #[test]
    fn png_round_trip_is_exact() {
        let path = temp_path("round_trip.png");
        let img = checker(5, 3);
        encode(&img, &path, SaveFormat::Png).unwrap();
        let back = decode(&path).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn png_round_trip_keeps_alpha() {
        let path = temp_path("round_trip_alpha.png");
        let src = RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8 * 80, y as u8 * 100, 7, 30 + x as u8]));
        let img = RasterImage::from_rgba_image(&src);
        encode(&img, &path, SaveFormat::Png).unwrap();
        let back = decode(&path).unwrap();
        assert_eq!(back.format(), PixelFormat::Bgra8);
        assert_eq!(back.to_rgba_image(), src);
    }

    #[test]
    fn bmp_round_trip_is_exact() {
        let path = temp_path("round_trip.bmp");
        let img = checker(7, 4);
        encode(&img, &path, SaveFormat::Bmp).unwrap();
        let back = decode(&path).unwrap();
        assert_eq!(back.to_rgb_image(), img.to_rgb_image());
    }

    #[test]
    fn jpeg_encode_completes() {
        let path = temp_path("lossy.jpg");
        let img = checker(16, 16);
        encode_with_quality(&img, &path, SaveFormat::Jpeg, 75).unwrap();
        let back = decode(&path).unwrap();
        assert_eq!((back.width(), back.height()), (16, 16));
    }

    #[test]
    fn decode_missing_file() {
        let err = decode(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, DecodeError::NotFound(_)));
    }

    #[test]
    fn decode_garbage_with_png_name_is_corrupt() {
        let path = temp_path("garbage.png");
        std::fs::write(&path, b"this is not an image at all").unwrap();
        let err = decode(&path).unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt(_)), "{:?}", err);
    }

    #[test]
    fn decode_truncated_png_is_corrupt() {
        let path = temp_path("truncated.png");
        let src = RgbImage::from_fn(64, 64, |x, y| image::Rgb([(x * 4) as u8, (y * 4) as u8, (x ^ y) as u8]));
        src.save_with_format(&path, ImageFormat::Png).unwrap();
        let full = std::fs::read(&path).unwrap();
        std::fs::write(&path, &full[..full.len() / 2]).unwrap();

        let err = decode(&path).unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt(_)), "{:?}", err);
    }

    #[test]
    fn decode_rejects_formats_outside_the_input_list() {
        let path = temp_path("not_accepted.tga");
        let src = RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]));
        src.save_with_format(&path, ImageFormat::Tga).unwrap();
        let err = decode(&path).unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported(_)));
    }

    #[test]
    fn encode_into_missing_directory_fails_with_io() {
        let img = checker(2, 2);
        let err = encode(&img, Path::new("/definitely/not/here/out.png"), SaveFormat::Png).unwrap_err();
        assert!(matches!(err, EncodeError::Io(_)));
    }

    #[test]
    fn failed_encode_keeps_existing_file() {
        let path = temp_path("keep_me.jpg");
        std::fs::write(&path, b"previous contents").unwrap();

        // Baseline JPEG cannot describe a width above 65535.
        let too_wide = RasterImage::new(65_536, 1, PixelFormat::Bgr8);
        assert!(encode(&too_wide, &path, SaveFormat::Jpeg).is_err());
        assert_eq!(std::fs::read(&path).unwrap(), b"previous contents");
    }

    #[test]
    fn preset_round_trip() {
        let path = temp_path("look.iadj");
        let state = AdjustmentState { grayscale: true, brightness: -42, contrast: 65 };
        save_preset(&state, &path).unwrap();
        assert_eq!(load_preset(&path).unwrap(), state);
    }

    #[test]
    fn preset_with_bad_magic_is_rejected() {
        let path = temp_path("bad.iadj");
        std::fs::write(&path, [0u8; 32]).unwrap();
        assert!(matches!(load_preset(&path), Err(PresetError::InvalidFormat(_))));
    }

    #[test]
    fn odd_width_bgr_survives_padding() {
        // 5 * 3 = 15 bytes per row, padded to 16 in the device layout.
        let img = checker(5, 2);
        assert_eq!(img.stride(), 16);
        assert_eq!(img.format(), PixelFormat::Bgr8);
    }
}
