//! Storage layer (`SQLite` or CSV files, plus cover assets)
//!
//! Both backends implement [`Storage`]; callers hold a `Box<dyn Storage>`
//! chosen once at startup by [`open_storage`].

pub mod csv;
pub mod db;
pub mod migrations;
pub mod sqlite;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::assets::AssetStore;
use crate::backup::{create, restore};
use crate::error::StoreResult;
use crate::paths::LibraryPaths;
use crate::record::{Book, WishlistItem};
use crate::settings::Settings;

pub use self::csv::CsvStore;
pub use db::Database;
pub use sqlite::SqliteStore;

/// Available storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    #[default]
    Csv,
}

impl Backend {
    /// The backend a migration from this one writes to
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Sqlite => Self::Csv,
            Self::Csv => Self::Sqlite,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "csv" => Ok(Self::Csv),
            other => Err(format!("Unknown storage backend '{other}'. Use 'sqlite' or 'csv'.")),
        }
    }
}

/// Operations every backend provides with identical semantics
pub trait Storage {
    /// Which backend this is
    fn backend(&self) -> Backend;

    /// The cover asset store used by this backend
    fn assets(&self) -> &AssetStore;

    /// Files holding this backend's records, bundled by full backups
    fn data_files(&self) -> Vec<PathBuf>;

    /// Add a book and return its new id
    ///
    /// # Errors
    /// Returns a validation error for an empty title, or a backend error
    fn add_book(&self, title: &str, author: &str, year: &str, notes: &str) -> StoreResult<i64>;

    /// All books sorted case-insensitively by title
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read
    fn list_books(&self) -> StoreResult<Vec<Book>>;

    /// Delete a book; unknown ids are ignored
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written
    fn delete_book(&self, id: i64) -> StoreResult<()>;

    /// Add a wishlist item and return its new id
    ///
    /// # Errors
    /// Returns a validation error for an empty title, or a backend error
    fn add_wishlist(&self, title: &str, notes: &str) -> StoreResult<i64>;

    /// All wishlist items sorted case-insensitively by title
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read
    fn list_wishlist(&self) -> StoreResult<Vec<WishlistItem>>;

    /// Delete a wishlist item; unknown ids are ignored
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written
    fn delete_wishlist(&self, id: i64) -> StoreResult<()>;

    /// Turn a wishlist item into a book, carrying over title, notes and a
    /// byte-identical copy of its cover. Returns `false` and changes nothing
    /// when the wishlist item does not exist.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read or written
    fn move_wishlist_to_books(&self, id: i64, author: &str, year: &str) -> StoreResult<bool>;

    /// Import `source` as the cover of a book. Does nothing when the source
    /// is missing or the book does not exist.
    ///
    /// # Errors
    /// Returns an error if the cover cannot be stored
    fn set_book_cover(&self, id: i64, source: &Path) -> StoreResult<()>;

    /// Import `source` as the cover of a wishlist item. Does nothing when
    /// the source is missing or the item does not exist.
    ///
    /// # Errors
    /// Returns an error if the cover cannot be stored
    fn set_wishlist_cover(&self, id: i64, source: &Path) -> StoreResult<()>;

    /// Write a full backup (data files and every cover) to `target`
    ///
    /// # Errors
    /// Returns an error if the archive cannot be written; an existing file
    /// at `target` is left as it was
    fn export_all(&self, target: &Path) -> StoreResult<()> {
        create::export_full(self.backend(), &self.data_files(), self.assets(), target)?;
        Ok(())
    }

    /// Restore a full backup over the current data and covers
    ///
    /// # Errors
    /// Returns an error if the archive is unreadable or fails verification;
    /// nothing is written in that case
    fn import_all(&mut self, source: &Path) -> StoreResult<()> {
        restore::import_full(self.backend(), &self.data_files(), self.assets(), source)?;
        Ok(())
    }

    /// Write every cover into a covers-only archive
    ///
    /// # Errors
    /// Returns an error if the archive cannot be written
    fn export_covers(&self, target: &Path) -> StoreResult<usize> {
        Ok(create::export_covers(self.assets(), target)?)
    }

    /// Extract a covers-only archive into the asset store
    ///
    /// # Errors
    /// Returns an error if the archive is unreadable or is not a covers archive
    fn import_covers(&self, source: &Path) -> StoreResult<usize> {
        Ok(restore::import_covers(self.assets(), source)?)
    }
}

/// Open the selected backend inside `paths`, creating files as needed
///
/// # Errors
/// Returns an error if the library directory or backend files cannot be
/// created or opened
pub fn open_storage(
    backend: Backend,
    paths: &LibraryPaths,
    settings: Settings,
) -> StoreResult<Box<dyn Storage>> {
    paths.ensure()?;
    let assets = AssetStore::new(paths.images(), settings);

    let storage: Box<dyn Storage> = match backend {
        Backend::Sqlite => Box::new(SqliteStore::open(&paths.database(), assets)?),
        Backend::Csv => Box::new(CsvStore::open(
            &paths.books_csv(),
            &paths.wishlist_csv(),
            assets,
        )?),
    };

    Ok(storage)
}
