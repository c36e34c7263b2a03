//! Archive restore
//!
//! The whole archive is read and verified before anything is written, so a
//! damaged or foreign archive leaves the library exactly as it was.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use super::types::FORMAT_VERSION;
use super::{
    hash_content, BackupManifest, RestoreSummary, COVERS_SENTINEL_NAME, IMAGES_PREFIX,
    MANIFEST_NAME,
};
use crate::assets::AssetStore;
use crate::storage::Backend;
use crate::util::{safe_join, validate_file_name, write_atomic, PathError};

/// Errors during restore
#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid backup format: {0}")]
    InvalidBackup(String),

    #[error("Unsupported backup version {0}")]
    UnsupportedVersion(u32),

    #[error("Backup is missing {0}")]
    MissingEntry(String),

    #[error("Size mismatch for {0}: expected {1} bytes, got {2}")]
    SizeMismatch(String, u64, u64),

    #[error("Hash mismatch for {0}: expected {1}, got {2}")]
    HashMismatch(String, String, String),

    #[error("Not a covers archive (no metadata.txt entry)")]
    NotCoversArchive,

    #[error("Path security error: {0}")]
    PathSecurity(#[from] PathError),
}

/// Every file entry of a zip, keyed by name
type Entries = BTreeMap<String, Vec<u8>>;

fn read_archive(source: &Path) -> Result<Entries, RestoreError> {
    let mut archive = ZipArchive::new(File::open(source)?)?;
    let mut entries = Entries::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        entries.insert(file.name().to_string(), content);
    }

    Ok(entries)
}

/// Check every digest the manifest lists; archives without a manifest pass
fn verify_manifest(entries: &Entries) -> Result<Option<BackupManifest>, RestoreError> {
    let Some(raw) = entries.get(MANIFEST_NAME) else {
        debug!("backup has no manifest, skipping verification");
        return Ok(None);
    };

    let manifest: BackupManifest = serde_json::from_slice(raw)
        .map_err(|e| RestoreError::InvalidBackup(format!("Failed to parse manifest: {e}")))?;
    if manifest.version > FORMAT_VERSION {
        return Err(RestoreError::UnsupportedVersion(manifest.version));
    }

    for entry in &manifest.entries {
        let content = entries
            .get(&entry.name)
            .ok_or_else(|| RestoreError::MissingEntry(entry.name.clone()))?;
        let size = content.len() as u64;
        if size != entry.size {
            return Err(RestoreError::SizeMismatch(entry.name.clone(), entry.size, size));
        }
        let actual = hash_content(content);
        if actual != entry.sha256 {
            return Err(RestoreError::HashMismatch(
                entry.name.clone(),
                entry.sha256.clone(),
                actual,
            ));
        }
    }

    Ok(Some(manifest))
}

/// Where an asset entry lands inside the asset store
///
/// Names that climb out of the store or are absolute are an error. Other
/// names that are not a plain file name (dot-files, nested folders) are
/// skipped with `None`.
fn asset_target(assets: &AssetStore, name: &str) -> Result<Option<PathBuf>, RestoreError> {
    let target = safe_join(assets.dir(), Path::new(&name.replace('\\', "/")))?;
    if let Err(e) = validate_file_name(name) {
        debug!(entry = %name, reason = %e, "skipping cover entry");
        return Ok(None);
    }
    Ok(Some(target))
}

/// Restore a full backup over `data_files` and the covers in `assets`
///
/// Root entries named like one of `data_files` replace that file and
/// `images/` entries replace same-named covers. Anything else, including
/// hidden or nested entries under `images/`, is skipped.
///
/// # Errors
/// Returns an error if the archive cannot be read, fails digest
/// verification, or holds an entry name that would escape the asset store;
/// nothing is written in those cases
pub fn import_full(
    backend: Backend,
    data_files: &[PathBuf],
    assets: &AssetStore,
    source: &Path,
) -> Result<RestoreSummary, RestoreError> {
    let entries = read_archive(source)?;
    if let Some(manifest) = verify_manifest(&entries)? {
        if manifest.backend != backend {
            warn!(
                archived = %manifest.backend,
                active = %backend,
                "backup was written by another backend"
            );
        }
    }

    let mut summary = RestoreSummary::default();
    let mut data = Vec::new();
    let mut covers = Vec::new();

    for (name, content) in &entries {
        if name == MANIFEST_NAME {
            continue;
        }
        if let Some(asset) = name.strip_prefix(IMAGES_PREFIX) {
            match asset_target(assets, asset)? {
                Some(path) => covers.push((path, content)),
                None => summary.skipped += 1,
            }
        } else if let Some(path) = data_files
            .iter()
            .find(|p| p.file_name().is_some_and(|n| n.to_string_lossy() == name.as_str()))
        {
            data.push((path, content));
        } else {
            debug!(entry = %name, "ignoring unknown backup entry");
            summary.skipped += 1;
        }
    }

    if data.is_empty() {
        warn!(%backend, "backup holds no data files for the active backend");
    }

    for (path, content) in data {
        write_atomic(path, content)?;
        summary.data_files += 1;
    }
    if !covers.is_empty() {
        fs::create_dir_all(assets.dir())?;
    }
    for (path, content) in covers {
        write_atomic(&path, content)?;
        summary.covers += 1;
    }

    info!(
        source = %source.display(),
        data_files = summary.data_files,
        covers = summary.covers,
        "imported full backup"
    );
    Ok(summary)
}

/// Extract a covers-only archive into `assets`
///
/// Returns the number of covers written. Hidden or nested entries are
/// skipped.
///
/// # Errors
/// Returns an error if the archive cannot be read, lacks the sentinel
/// entry, or holds an entry name that would escape the asset store
pub fn import_covers(assets: &AssetStore, source: &Path) -> Result<usize, RestoreError> {
    let entries = read_archive(source)?;
    if !entries.contains_key(COVERS_SENTINEL_NAME) {
        return Err(RestoreError::NotCoversArchive);
    }

    let covers = entries
        .iter()
        .filter(|(name, _)| name.as_str() != COVERS_SENTINEL_NAME)
        .filter_map(|(name, content)| {
            asset_target(assets, name)
                .map(|target| target.map(|path| (path, content)))
                .transpose()
        })
        .collect::<Result<Vec<_>, RestoreError>>()?;

    fs::create_dir_all(assets.dir())?;
    for (path, content) in &covers {
        write_atomic(path, content)?;
    }

    info!(source = %source.display(), count = covers.len(), "imported covers");
    Ok(covers.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, content) in entries {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }

    fn assets(dir: &TempDir) -> AssetStore {
        AssetStore::new(dir.path().join("images"), Settings::default())
    }

    #[test]
    fn test_import_without_manifest() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("old.zip");
        write_zip(
            &archive,
            &[
                ("books.csv", b"id,title\n1,Berserk\n"),
                ("images/book_1.jpg", b"jpeg"),
                ("readme.txt", b"ignored"),
            ],
        );
        let books = dir.path().join("books.csv");

        let summary = import_full(Backend::Csv, &[books.clone()], &assets(&dir), &archive).unwrap();

        assert_eq!(summary.data_files, 1);
        assert_eq!(summary.covers, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(fs::read(books).unwrap(), b"id,title\n1,Berserk\n");
        assert!(dir.path().join("images/book_1.jpg").is_file());
        assert!(!dir.path().join("readme.txt").exists());
    }

    #[test]
    fn test_import_skips_hidden_and_nested_covers() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("mac.zip");
        write_zip(
            &archive,
            &[
                ("books.csv", b"id,title\n1,Berserk\n"),
                ("images/.DS_Store", b"finder"),
                ("images/book_1.jpg", b"jpeg"),
                ("images/thumbs/book_1.jpg", b"small"),
            ],
        );
        let books = dir.path().join("books.csv");

        let summary = import_full(Backend::Csv, &[books], &assets(&dir), &archive).unwrap();

        assert_eq!(summary.covers, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(fs::read(dir.path().join("images/book_1.jpg")).unwrap(), b"jpeg");
        assert!(!dir.path().join("images/.DS_Store").exists());
        assert!(!dir.path().join("images/thumbs").exists());
    }

    #[test]
    fn test_rejects_traversal_before_writing() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("evil.zip");
        write_zip(
            &archive,
            &[
                ("books.csv", b"id,title\n"),
                ("images/../../escape.txt", b"boom"),
            ],
        );
        let books = dir.path().join("books.csv");
        fs::write(&books, b"original").unwrap();

        let result = import_full(Backend::Csv, &[books.clone()], &assets(&dir), &archive);

        assert!(matches!(result, Err(RestoreError::PathSecurity(_))));
        assert_eq!(fs::read(books).unwrap(), b"original");
    }

    #[test]
    fn test_rejects_backslash_traversal() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("evil.zip");
        write_zip(&archive, &[("images/..\\..\\escape.txt", b"boom")]);

        let result = import_full(Backend::Csv, &[], &assets(&dir), &archive);

        assert!(matches!(result, Err(RestoreError::PathSecurity(_))));
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn test_rejects_wrong_size_with_matching_digest() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("resized.zip");
        let mut manifest = BackupManifest::new(Backend::Csv);
        manifest.add_entry("books.csv", b"id,title\n");
        manifest.entries[0].size = 3;
        let manifest = serde_json::to_vec(&manifest).unwrap();
        write_zip(
            &archive,
            &[("books.csv", b"id,title\n"), ("manifest.json", manifest.as_slice())],
        );
        let books = dir.path().join("books.csv");
        fs::write(&books, b"original").unwrap();

        let result = import_full(Backend::Csv, &[books.clone()], &assets(&dir), &archive);

        assert!(matches!(
            result,
            Err(RestoreError::SizeMismatch(ref name, 3, 9)) if name == "books.csv"
        ));
        assert_eq!(fs::read(books).unwrap(), b"original");
    }

    #[test]
    fn test_rejects_newer_manifest() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("future.zip");
        let manifest = br#"{"version":99,"backend":"csv","exported_at":"2030-01-01T00:00:00Z","entries":[]}"#;
        write_zip(&archive, &[("manifest.json", manifest)]);

        let result = import_full(Backend::Csv, &[], &assets(&dir), &archive);
        assert!(matches!(result, Err(RestoreError::UnsupportedVersion(99))));
    }

    #[test]
    fn test_covers_import_requires_sentinel() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("covers.zip");
        write_zip(&archive, &[("book_1.jpg", b"jpeg")]);

        let result = import_covers(&assets(&dir), &archive);
        assert!(matches!(result, Err(RestoreError::NotCoversArchive)));
        assert!(!dir.path().join("images").exists());
    }

    #[test]
    fn test_covers_import_extracts_files() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("covers.zip");
        write_zip(
            &archive,
            &[("metadata.txt", b"shelf_covers"), ("wish_2.png", b"png")],
        );

        let count = import_covers(&assets(&dir), &archive).unwrap();

        assert_eq!(count, 1);
        assert_eq!(fs::read(dir.path().join("images/wish_2.png")).unwrap(), b"png");
        assert!(!dir.path().join("images/metadata.txt").exists());
    }

    #[test]
    fn test_covers_import_skips_dot_files() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("covers.zip");
        write_zip(
            &archive,
            &[
                ("metadata.txt", b"shelf_covers"),
                (".DS_Store", b"finder"),
                ("book_4.jpg", b"jpeg"),
            ],
        );

        let count = import_covers(&assets(&dir), &archive).unwrap();

        assert_eq!(count, 1);
        assert!(dir.path().join("images/book_4.jpg").is_file());
        assert!(!dir.path().join("images/.DS_Store").exists());
    }
}
