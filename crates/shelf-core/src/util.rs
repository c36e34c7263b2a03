//! Path validation and atomic file writes

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors related to path validation
#[derive(Error, Debug)]
pub enum PathError {
    #[error("Path traversal attempt detected: {0}")]
    TraversalAttempt(String),

    #[error("Path escapes root directory: {0}")]
    EscapesRoot(String),

    #[error("Invalid path component: {0}")]
    InvalidComponent(String),
}

/// Join an archive entry name onto `root`
///
/// Every component must be a plain name: `..` anywhere, absolute paths and
/// null bytes are refused rather than normalized away. An existing target is
/// also canonicalized, so a symlink inside `root` cannot redirect the write.
///
/// # Errors
/// Returns an error if the name is empty or would land outside `root`
pub fn safe_join(root: &Path, untrusted: &Path) -> Result<PathBuf, PathError> {
    let mut joined = root.to_path_buf();
    let mut depth = 0usize;

    for component in untrusted.components() {
        match component {
            Component::Normal(part) if part.to_string_lossy().contains('\0') => {
                return Err(PathError::InvalidComponent("Null byte in path".to_string()));
            }
            Component::Normal(part) => {
                joined.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(PathError::TraversalAttempt(untrusted.display().to_string()));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathError::EscapesRoot(untrusted.display().to_string()));
            }
        }
    }
    if depth == 0 {
        return Err(PathError::InvalidComponent("Empty path".to_string()));
    }

    if let (Ok(root), Ok(target)) = (root.canonicalize(), joined.canonicalize()) {
        if !target.starts_with(root) {
            return Err(PathError::EscapesRoot(joined.display().to_string()));
        }
    }

    Ok(joined)
}

/// Validate a bare file name (an asset or data file inside an archive)
///
/// # Errors
/// Returns an error if the name is empty, hidden, or contains a separator
pub fn validate_file_name(name: &str) -> Result<(), PathError> {
    if name.is_empty() {
        return Err(PathError::InvalidComponent("Empty name".to_string()));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(PathError::TraversalAttempt(format!(
            "Name contains path separator: {name}"
        )));
    }

    if name.contains("..") {
        return Err(PathError::TraversalAttempt(format!(
            "Name contains parent directory reference: {name}"
        )));
    }

    if name.starts_with('.') {
        return Err(PathError::InvalidComponent(format!(
            "Name cannot start with dot: {name}"
        )));
    }

    if name.contains('\0') {
        return Err(PathError::InvalidComponent(
            "Name contains null byte".to_string(),
        ));
    }

    Ok(())
}

/// Replace `path` with `contents` so readers only ever see the old or the
/// new file: write a temporary file in the same directory, then rename it
/// over the original
///
/// # Errors
/// Returns an error if the temporary file cannot be written or renamed
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

/// Directory that holds `path`, or `.` for a bare file name
#[must_use]
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Check whether two paths name the same existing file
#[must_use]
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
