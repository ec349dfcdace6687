use std::path::{Path, PathBuf};

use crate::io::{SaveFormat, DEFAULT_JPEG_QUALITY};
use crate::log_warn;
use crate::ops::ProcessingStrategy;

const SETTINGS_FILE: &str = "imgadjust.cfg";

/// Settings that persist across runs, stored as `key=value` lines.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Strategy used when none is requested explicitly
    pub default_strategy: ProcessingStrategy,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Format used when the output path has no usable extension
    pub default_save_format: SaveFormat,
    /// Write the session log file
    pub log_to_file: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_strategy: ProcessingStrategy::Fast,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            default_save_format: SaveFormat::Jpeg,
            log_to_file: true,
        }
    }
}

impl Settings {
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("imgadjust");
            return Some(config_dir.join(SETTINGS_FILE));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            return Some(PathBuf::from(appdata).join("imgadjust").join(SETTINGS_FILE));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            let config_dir = PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("imgadjust");
            return Some(config_dir.join(SETTINGS_FILE));
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe().ok().and_then(|p| p.parent().map(|d| d.join(SETTINGS_FILE)))
        }
    }

    /// Load from the default location; defaults when missing or unreadable.
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else { return Self::default() };
        Self::parse(&content)
    }

    /// Parse `key=value` lines. Unknown keys and bad values are skipped.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') { continue; }
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            match key {
                "default_strategy" => match val.parse() {
                    Ok(strategy) => s.default_strategy = strategy,
                    Err(e) => log_warn!("settings: {}", e),
                },
                "jpeg_quality" => match val.parse::<u8>() {
                    Ok(q) => s.jpeg_quality = q.clamp(1, 100),
                    Err(_) => log_warn!("settings: bad jpeg_quality '{}'", val),
                },
                "default_save_format" => match val.parse() {
                    Ok(format) => s.default_save_format = format,
                    Err(e) => log_warn!("settings: {}", e),
                },
                "log_to_file" => match parse_bool(val) {
                    Some(b) => s.log_to_file = b,
                    None => log_warn!("settings: bad log_to_file '{}'", val),
                },
                other => log_warn!("settings: unknown key '{}'", other),
            }
        }
        s
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "default_strategy={}\n\
             jpeg_quality={}\n\
             default_save_format={}\n\
             log_to_file={}\n",
            self.default_strategy,
            self.jpeg_quality,
            self.default_save_format,
            self.log_to_file,
        )
    }

    /// Save settings to the default location.
    pub fn save(&self) -> std::io::Result<()> {
        match Self::settings_path() {
            Some(path) => self.save_to(&path),
            None => Ok(()),
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
