//! On-disk layout of a library

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};

/// Directory under the user's home that holds the library
pub const DATA_DIR_NAME: &str = ".shelf";

/// File and directory locations inside a library root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryPaths {
    root: PathBuf,
}

impl LibraryPaths {
    /// Use `root` as the library directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The default library directory, `~/.shelf`
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn user() -> StoreResult<Self> {
        let home = dirs::home_dir().ok_or(StoreError::HomeNotFound)?;
        Ok(Self::new(home.join(DATA_DIR_NAME)))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// SQLite database file
    #[must_use]
    pub fn database(&self) -> PathBuf {
        self.root.join("shelf.db")
    }

    #[must_use]
    pub fn books_csv(&self) -> PathBuf {
        self.root.join("books.csv")
    }

    #[must_use]
    pub fn wishlist_csv(&self) -> PathBuf {
        self.root.join("wishlist.csv")
    }

    #[must_use]
    pub fn settings(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    /// Cover asset directory, a sibling of the data files
    #[must_use]
    pub fn images(&self) -> PathBuf {
        self.root.join("images")
    }

    /// Create the library and image directories if missing
    ///
    /// # Errors
    /// Returns an error if a directory cannot be created
    pub fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::create_dir_all(self.images())?;
        Ok(())
    }
}
