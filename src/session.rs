use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::error::{DecodeError, EncodeError};
use crate::io::{self, SaveFormat, DEFAULT_JPEG_QUALITY};
use crate::ops::{render, AdjustmentState, ProcessingStrategy};
use crate::raster::RasterImage;
use crate::{log_err, log_info};

/// Original + current buffers of one open image.
struct Buffers {
    original: RasterImage,
    current: RasterImage,
}

/// Single open image.
///
/// The original is never modified. Every state change re-derives `current`
/// from it synchronously. After [`Session::close`] the buffers are released and
/// every operation becomes a no-op.
pub struct Session {
    pub id: Uuid,
    /// Display name (derived from path or "Untitled")
    pub name: String,
    path: Option<PathBuf>,
    strategy: ProcessingStrategy,
    state: AdjustmentState,
    buffers: Option<Buffers>,
    jpeg_quality: u8,
    last_render: Duration,
}

impl Session {
    /// Decode `path` and start a session on it. No session exists on failure.
    pub fn open(path: &Path, strategy: ProcessingStrategy) -> Result<Self, DecodeError> {
        let image = io::decode(path).inspect_err(|e| {
            log_err!("open {} failed: {}", path.display(), e);
        })?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        let mut session = Self::from_image(image, strategy);
        session.name = name;
        session.path = Some(path.to_path_buf());
        log_info!(
            "opened {} ({}x{}, {:?}, {} processing)",
            session.name,
            session.original().map_or(0, |i| i.width()),
            session.original().map_or(0, |i| i.height()),
            session.original().map(|i| i.format()),
            strategy
        );
        Ok(session)
    }

    /// Start a session on an already decoded image.
    pub fn from_image(original: RasterImage, strategy: ProcessingStrategy) -> Self {
        let current = original.clone();
        Self {
            id: Uuid::new_v4(),
            name: "Untitled".to_string(),
            path: None,
            strategy,
            state: AdjustmentState::identity(),
            buffers: Some(Buffers { original, current }),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            last_render: Duration::ZERO,
        }
    }

    /// Window title in the "name (mode processing)" form.
    pub fn title(&self) -> String {
        format!("{} ({} processing)", self.name, self.strategy)
    }

    // ---- accessors ----------------------------------------------------------

    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    pub fn strategy(&self) -> ProcessingStrategy { self.strategy }

    pub fn state(&self) -> AdjustmentState { self.state }

    pub fn is_open(&self) -> bool { self.buffers.is_some() }

    pub fn original(&self) -> Option<&RasterImage> {
        self.buffers.as_ref().map(|b| &b.original)
    }

    pub fn current(&self) -> Option<&RasterImage> {
        self.buffers.as_ref().map(|b| &b.current)
    }

    /// Wall time of the most recent re-render.
    pub fn last_render(&self) -> Duration { self.last_render }

    pub fn set_jpeg_quality(&mut self, quality: u8) {
        self.jpeg_quality = quality.clamp(1, 100);
    }

    // ---- transitions --------------------------------------------------------

    pub fn set_grayscale(&mut self, enabled: bool) {
        if !self.is_open() { return; }
        self.state.grayscale = enabled;
        self.rerender();
    }

    pub fn toggle_grayscale(&mut self) {
        if !self.is_open() { return; }
        self.state.grayscale = !self.state.grayscale;
        self.rerender();
    }

    pub fn set_brightness(&mut self, value: i32) {
        if !self.is_open() { return; }
        self.state.set_brightness(value);
        self.rerender();
    }

    pub fn set_contrast(&mut self, value: i32) {
        if !self.is_open() { return; }
        self.state.set_contrast(value);
        self.rerender();
    }

    /// Replace the whole adjustment state at once (e.g. from a preset).
    pub fn apply_state(&mut self, state: AdjustmentState) {
        if !self.is_open() { return; }
        self.state = state.clamped();
        self.rerender();
    }

    /// Back to the identity transform.
    pub fn reset(&mut self) {
        if !self.is_open() { return; }
        self.state = AdjustmentState::identity();
        self.rerender();
    }

    fn rerender(&mut self) {
        let Some(buffers) = self.buffers.as_mut() else { return };
        let start = Instant::now();
        buffers.current = render(&buffers.original, &self.state, self.strategy.engine());
        self.last_render = start.elapsed();
        log_info!(
            "render {} [{}] grayscale={} brightness={} contrast={} in {:.1}ms",
            self.name,
            self.strategy,
            self.state.grayscale,
            self.state.brightness,
            self.state.contrast,
            self.last_render.as_secs_f64() * 1000.0
        );
    }

    // ---- persistence --------------------------------------------------------

    /// Write the current image. The session is left unchanged on failure.
    /// Returns `Ok(false)` when nothing is loaded.
    pub fn save(&self, path: &Path, format: SaveFormat) -> Result<bool, EncodeError> {
        let Some(current) = self.current() else { return Ok(false) };
        match io::encode_with_quality(current, path, format, self.jpeg_quality) {
            Ok(()) => {
                log_info!("saved {} as {} to {}", self.name, format, path.display());
                Ok(true)
            }
            Err(e) => {
                log_err!("save {} to {} failed: {}", self.name, path.display(), e);
                Err(e)
            }
        }
    }

    /// Save with the format taken from the extension (JPEG when unknown).
    pub fn save_as(&self, path: &Path) -> Result<bool, EncodeError> {
        self.save(path, SaveFormat::from_path(path))
    }

    /// Release both buffers. Later calls are no-ops.
    pub fn close(&mut self) {
        if self.buffers.take().is_some() {
            log_info!("closed {}", self.name);
        }
    }
}
