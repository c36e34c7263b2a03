//! Backup manifest and restore results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::hash_content;
use crate::storage::Backend;

/// Newest manifest layout this build reads and the one it writes
pub const FORMAT_VERSION: u32 = 1;

/// Describes the contents of a full backup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupManifest {
    /// Manifest layout version
    pub version: u32,
    /// Backend that was active when the backup was written
    pub backend: Backend,
    /// When the backup was written
    pub exported_at: DateTime<Utc>,
    /// Every bundled entry except the manifest itself
    pub entries: Vec<ManifestEntry>,
}

impl BackupManifest {
    /// Create an empty manifest for `backend`
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self {
            version: FORMAT_VERSION,
            backend,
            exported_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Record an entry and its digest
    pub fn add_entry(&mut self, name: impl Into<String>, content: &[u8]) {
        self.entries.push(ManifestEntry {
            name: name.into(),
            sha256: hash_content(content),
            size: content.len() as u64,
        });
    }

    /// Look up an entry by archive name
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// A file in a backup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Name inside the archive
    pub name: String,
    /// SHA256 hash of the content
    pub sha256: String,
    /// Size in bytes
    pub size: u64,
}

/// What an import wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RestoreSummary {
    /// Data files restored to their canonical locations
    pub data_files: usize,
    /// Cover files written to the asset store
    pub covers: usize,
    /// Entries that did not belong to the active backend
    pub skipped: usize,
}
