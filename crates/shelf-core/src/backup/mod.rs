//! Backup archives
//!
//! A full backup is a zip holding the backend's data files at the root,
//! every cover under `images/`, and a `manifest.json` with a SHA-256 digest
//! per entry. A covers-only archive holds the covers at the root next to a
//! `metadata.txt` sentinel.

pub mod create;
pub mod restore;
pub mod types;

use sha2::{Digest, Sha256};

pub use types::{BackupManifest, ManifestEntry, RestoreSummary};

/// Directory inside a full backup that holds the covers
pub const IMAGES_PREFIX: &str = "images/";

/// Manifest entry name
pub const MANIFEST_NAME: &str = "manifest.json";

/// Entry that marks a covers-only archive
pub const COVERS_SENTINEL_NAME: &str = "metadata.txt";

/// Contents of the sentinel entry
pub const COVERS_SENTINEL: &str = "shelf_covers";

fn hash_content(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
