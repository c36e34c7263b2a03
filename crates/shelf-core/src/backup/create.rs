//! Archive creation

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::ZipWriter;

use super::{BackupManifest, COVERS_SENTINEL, COVERS_SENTINEL_NAME, IMAGES_PREFIX, MANIFEST_NAME};
use crate::assets::AssetStore;
use crate::storage::Backend;
use crate::util::parent_dir;

/// Errors during archive creation
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to serialize manifest: {0}")]
    Json(#[from] serde_json::Error),
}

/// Zip written to a temporary file next to its target and renamed into
/// place only once complete
struct PendingArchive {
    zip: ZipWriter<NamedTempFile>,
    options: FileOptions,
}

impl PendingArchive {
    fn create(target: &Path) -> Result<Self, BackupError> {
        let dir = parent_dir(target);
        fs::create_dir_all(dir)?;
        Ok(Self {
            zip: ZipWriter::new(NamedTempFile::new_in(dir)?),
            options: FileOptions::default().compression_method(zip::CompressionMethod::Deflated),
        })
    }

    fn add(&mut self, name: &str, content: &[u8]) -> Result<(), BackupError> {
        self.zip.start_file(name, self.options)?;
        self.zip.write_all(content)?;
        Ok(())
    }

    fn finish(mut self, target: &Path) -> Result<(), BackupError> {
        let tmp = self.zip.finish()?;
        tmp.as_file().sync_all()?;
        tmp.persist(target).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Write a full backup of `data_files` and every cover in `assets`
///
/// Data files that do not exist yet are left out.
///
/// # Errors
/// Returns an error if a file cannot be read or the archive cannot be
/// written; `target` is untouched in that case
pub fn export_full(
    backend: Backend,
    data_files: &[PathBuf],
    assets: &AssetStore,
    target: &Path,
) -> Result<BackupManifest, BackupError> {
    let mut archive = PendingArchive::create(target)?;
    let mut manifest = BackupManifest::new(backend);

    for path in data_files {
        let Some(name) = file_name(path) else {
            continue;
        };
        if !path.is_file() {
            debug!(path = %path.display(), "data file missing, not bundled");
            continue;
        }
        let content = fs::read(path)?;
        archive.add(&name, &content)?;
        manifest.add_entry(name, &content);
    }

    for path in assets.list()? {
        let Some(name) = file_name(&path) else {
            continue;
        };
        let name = format!("{IMAGES_PREFIX}{name}");
        let content = fs::read(&path)?;
        archive.add(&name, &content)?;
        manifest.add_entry(name, &content);
    }

    archive.add(MANIFEST_NAME, &serde_json::to_vec_pretty(&manifest)?)?;
    archive.finish(target)?;

    info!(
        target = %target.display(),
        entries = manifest.entries.len(),
        "exported full backup"
    );
    Ok(manifest)
}

/// Write every cover in `assets` to a covers-only archive
///
/// Returns the number of covers written.
///
/// # Errors
/// Returns an error if a cover cannot be read or the archive cannot be
/// written; `target` is untouched in that case
pub fn export_covers(assets: &AssetStore, target: &Path) -> Result<usize, BackupError> {
    let mut archive = PendingArchive::create(target)?;
    let mut count = 0;

    for path in assets.list()? {
        let Some(name) = file_name(&path) else {
            continue;
        };
        archive.add(&name, &fs::read(&path)?)?;
        count += 1;
    }

    archive.add(COVERS_SENTINEL_NAME, COVERS_SENTINEL.as_bytes())?;
    archive.finish(target)?;

    info!(target = %target.display(), count, "exported covers");
    Ok(count)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
