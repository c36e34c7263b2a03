//! Cover asset store
//!
//! Covers are files in one flat directory named after the record that owns
//! them: `book_12.jpg`, `wish_3.png`. Records keep the path of their cover;
//! when a record is read the path is checked again and a missing file reads
//! as "no cover".

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::imaging::{CoverProcessor, ImageResizer, PlainCopy};
use crate::record::ItemKind;
use crate::settings::Settings;
use crate::util::same_file;

/// Manages cover files on disk
pub struct AssetStore {
    dir: PathBuf,
    settings: Settings,
    processor: Box<dyn CoverProcessor>,
}

impl AssetStore {
    /// Create an asset store rooted at `dir`
    ///
    /// Covers are resized with the `image` crate when `resize_enabled` is
    /// set and copied byte for byte otherwise.
    pub fn new(dir: impl Into<PathBuf>, settings: Settings) -> Self {
        let processor: Box<dyn CoverProcessor> = if settings.resize_enabled {
            Box::new(ImageResizer)
        } else {
            Box::new(PlainCopy)
        };
        Self {
            dir: dir.into(),
            settings,
            processor,
        }
    }

    /// Replace the image collaborator
    #[must_use]
    pub fn with_processor(mut self, processor: impl CoverProcessor + 'static) -> Self {
        self.processor = Box::new(processor);
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the cover for `kind`/`id` lands, keeping the source's extension
    #[must_use]
    pub fn cover_path(&self, kind: ItemKind, id: i64, source: &Path) -> PathBuf {
        let ext = source
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        self.dir
            .join(format!("{}_{}{}", kind.asset_prefix(), id, ext))
    }

    /// Import `source` as the cover of `kind`/`id` through the processor
    ///
    /// Returns `None` without touching anything when `source` is empty or
    /// does not exist. A processing failure falls back to a verbatim copy.
    ///
    /// # Errors
    /// Returns an error only if the fallback copy itself fails
    pub fn import_cover(
        &self,
        kind: ItemKind,
        id: i64,
        source: &Path,
    ) -> io::Result<Option<PathBuf>> {
        let Some(dest) = self.prepare(kind, id, source)? else {
            return Ok(None);
        };
        if same_file(source, &dest) {
            return Ok(Some(dest));
        }

        match self.processor.process(source, &dest, &self.settings) {
            Ok(()) => {
                debug!(source = %source.display(), dest = %dest.display(), "processed cover");
            }
            Err(e) => {
                warn!(source = %source.display(), error = %e, "cover processing failed, copying original");
                fs::copy(source, &dest)?;
            }
        }
        Ok(Some(dest))
    }

    /// Copy `source` byte for byte as the cover of `kind`/`id`
    ///
    /// # Errors
    /// Returns an error if the file cannot be copied
    pub fn copy_cover(
        &self,
        kind: ItemKind,
        id: i64,
        source: &Path,
    ) -> io::Result<Option<PathBuf>> {
        let Some(dest) = self.prepare(kind, id, source)? else {
            return Ok(None);
        };
        if !same_file(source, &dest) {
            fs::copy(source, &dest)?;
        }
        Ok(Some(dest))
    }

    fn prepare(&self, kind: ItemKind, id: i64, source: &Path) -> io::Result<Option<PathBuf>> {
        if source.as_os_str().is_empty() || !source.is_file() {
            debug!(source = %source.display(), "cover source missing, nothing to do");
            return Ok(None);
        }
        fs::create_dir_all(&self.dir)?;
        Ok(Some(self.cover_path(kind, id, source)))
    }

    /// Resolve a stored cover reference to an existing file
    ///
    /// The file of the same name inside this store wins, so a library that
    /// was restored into another directory still finds its covers. A
    /// reference that matches nothing reads as no cover.
    #[must_use]
    pub fn resolve(&self, stored: &str) -> Option<PathBuf> {
        if stored.trim().is_empty() {
            return None;
        }
        let path = PathBuf::from(stored);

        if let Some(name) = path.file_name() {
            let local = self.dir.join(name);
            if local.is_file() {
                return Some(local);
            }
        }
        if path.is_file() {
            return Some(path);
        }

        debug!(cover = stored, "stale cover reference");
        None
    }

    /// Every cover file currently in the store, read fresh from disk
    ///
    /// # Errors
    /// Returns an error if the directory cannot be read
    pub fn list(&self) -> io::Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(io::Error::from)?;
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if entry.file_type().is_file() && !hidden {
                files.push(entry.into_path());
            }
        }
        files.sort();

        Ok(files)
    }
}
