//! Cover processing and preview settings
//!
//! Settings live in a small JSON file next to the library data. Values in
//! the file are merged over the built-in defaults field by field; a missing
//! or unreadable file means the defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

use crate::util::write_atomic;

/// User-adjustable settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Resize and re-encode covers when they are imported
    pub resize_enabled: bool,
    /// Largest stored cover width in pixels
    pub max_width: u32,
    /// Largest stored cover height in pixels
    pub max_height: u32,
    /// Width of cover previews in pixels
    pub preview_width: u32,
    /// Height of cover previews in pixels
    pub preview_height: u32,
    /// JPEG encode quality (1-100)
    pub quality: u8,
    /// Spend extra effort on smaller output files
    pub optimize: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            resize_enabled: true,
            max_width: 800,
            max_height: 1200,
            preview_width: 300,
            preview_height: 440,
            quality: 85,
            optimize: true,
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to the defaults when the file
    /// is missing or malformed
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read settings, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed settings, using defaults");
                Self::default()
            }
        }
    }

    /// Write settings to `path`
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        write_atomic(path, json.as_bytes())?;
        debug!(path = %path.display(), "saved settings");
        Ok(())
    }

    /// JPEG quality clamped to the encoder's accepted range
    #[must_use]
    pub fn jpeg_quality(&self) -> u8 {
        self.quality.clamp(1, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let settings = Settings {
            max_width: 500,
            ..Settings::default()
        };
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path);
        assert_eq!(loaded.max_width, 500);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            Settings::load(&dir.path().join("settings.json")),
            Settings::default()
        );
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"quality": 60, "resize_enabled": false}"#).unwrap();

        let loaded = Settings::load(&path);
        assert_eq!(loaded.quality, 60);
        assert!(!loaded.resize_enabled);
        assert_eq!(loaded.max_height, 1200);
        assert_eq!(loaded.preview_width, 300);
    }

    #[test]
    fn test_jpeg_quality_clamped() {
        let settings = Settings {
            quality: 0,
            ..Settings::default()
        };
        assert_eq!(settings.jpeg_quality(), 1);
    }
}
