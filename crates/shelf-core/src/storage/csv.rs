//! CSV backend
//!
//! One file per list with a header row. Every mutation reads all rows,
//! changes them in memory and writes the whole file back through a
//! temporary file that is renamed over the original.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

use super::{Backend, Storage};
use crate::assets::AssetStore;
use crate::error::{StoreError, StoreResult};
use crate::record::{sort_by_title, validate_title, Book, ItemKind, WishlistItem};
use crate::util::write_atomic;

/// A row as stored on disk; ids stay text so unparseable rows survive rewrites
trait CsvRow: Serialize + DeserializeOwned {
    const HEADERS: &'static [&'static str];

    fn id(&self) -> &str;

    fn set_cover(&mut self, cover: String);

    fn parsed_id(&self) -> Option<i64> {
        self.id().trim().parse().ok()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct BookRow {
    id: String,
    title: String,
    author: String,
    year: String,
    notes: String,
    cover: String,
}

impl CsvRow for BookRow {
    const HEADERS: &'static [&'static str] = &["id", "title", "author", "year", "notes", "cover"];

    fn id(&self) -> &str {
        &self.id
    }

    fn set_cover(&mut self, cover: String) {
        self.cover = cover;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct WishlistRow {
    id: String,
    title: String,
    notes: String,
    cover: String,
}

impl CsvRow for WishlistRow {
    const HEADERS: &'static [&'static str] = &["id", "title", "notes", "cover"];

    fn id(&self) -> &str {
        &self.id
    }

    fn set_cover(&mut self, cover: String) {
        self.cover = cover;
    }
}

/// Records in two CSV files
pub struct CsvStore {
    books_file: PathBuf,
    wishlist_file: PathBuf,
    assets: AssetStore,
}

impl CsvStore {
    /// Open the two files, creating them with only a header row if missing
    ///
    /// # Errors
    /// Returns an error if a missing file cannot be created
    pub fn open(books_file: &Path, wishlist_file: &Path, assets: AssetStore) -> StoreResult<Self> {
        let store = Self {
            books_file: books_file.to_path_buf(),
            wishlist_file: wishlist_file.to_path_buf(),
            assets,
        };

        if !store.books_file.exists() {
            write_rows::<BookRow>(&store.books_file, &[])?;
        }
        if !store.wishlist_file.exists() {
            write_rows::<WishlistRow>(&store.wishlist_file, &[])?;
        }

        Ok(store)
    }

    fn set_cover<R: CsvRow>(
        &self,
        file: &Path,
        kind: ItemKind,
        id: i64,
        source: &Path,
    ) -> StoreResult<()> {
        let mut rows: Vec<R> = read_rows(file)?;
        let Some(row) = rows.iter_mut().find(|r| r.parsed_id() == Some(id)) else {
            debug!(%kind, id, "no such record, cover not set");
            return Ok(());
        };

        if let Some(dest) = self.assets.import_cover(kind, id, source)? {
            row.set_cover(dest.display().to_string());
            write_rows(file, &rows)?;
        }
        Ok(())
    }

    /// Put `books.csv` back to `book_rows` and drop the cover copied for a
    /// move whose wishlist write failed
    fn undo_move(&self, book_rows: &[BookRow], copied: Option<&Path>) {
        if let Err(e) = write_rows(&self.books_file, book_rows) {
            error!(error = %e, "could not undo move, item is now in both lists");
        }
        if let Some(cover) = copied {
            if let Err(e) = std::fs::remove_file(cover) {
                warn!(cover = %cover.display(), error = %e, "could not remove copied cover");
            }
        }
    }
}

fn read_rows<R: CsvRow>(path: &Path) -> StoreResult<Vec<R>> {
    let mut reader = ::csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| StoreError::csv(path, e))?;

    reader
        .deserialize()
        .collect::<Result<Vec<R>, _>>()
        .map_err(|e| StoreError::csv(path, e))
}

fn write_rows<R: CsvRow>(path: &Path, rows: &[R]) -> StoreResult<()> {
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(R::HEADERS)
        .map_err(|e| StoreError::csv(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| StoreError::csv(path, e))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| StoreError::Io(e.into_error()))?;
    write_atomic(path, &bytes)?;

    Ok(())
}

/// Highest parseable id plus one; unparseable ids are ignored
fn next_id<R: CsvRow>(rows: &[R]) -> i64 {
    rows.iter()
        .filter_map(|r| r.parsed_id())
        .fold(0, i64::max)
        + 1
}

fn delete_row<R: CsvRow>(path: &Path, id: i64) -> StoreResult<()> {
    let mut rows: Vec<R> = read_rows(path)?;
    let before = rows.len();
    rows.retain(|r| r.parsed_id() != Some(id));

    if rows.len() != before {
        write_rows(path, &rows)?;
    }
    Ok(())
}

impl Storage for CsvStore {
    fn backend(&self) -> Backend {
        Backend::Csv
    }

    fn assets(&self) -> &AssetStore {
        &self.assets
    }

    fn data_files(&self) -> Vec<PathBuf> {
        vec![self.books_file.clone(), self.wishlist_file.clone()]
    }

    fn add_book(&self, title: &str, author: &str, year: &str, notes: &str) -> StoreResult<i64> {
        validate_title(title)?;

        let mut rows: Vec<BookRow> = read_rows(&self.books_file)?;
        let id = next_id(&rows);
        rows.push(BookRow {
            id: id.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            year: year.to_string(),
            notes: notes.to_string(),
            cover: String::new(),
        });
        write_rows(&self.books_file, &rows)?;

        Ok(id)
    }

    fn list_books(&self) -> StoreResult<Vec<Book>> {
        let rows: Vec<BookRow> = read_rows(&self.books_file)?;

        let mut books: Vec<Book> = rows
            .into_iter()
            .filter_map(|row| {
                let id = row.parsed_id()?;
                Some(Book {
                    id,
                    cover: self.assets.resolve(&row.cover),
                    title: row.title,
                    author: row.author,
                    year: row.year,
                    notes: row.notes,
                })
            })
            .collect();

        sort_by_title(&mut books, |b| b.title.as_str());
        Ok(books)
    }

    fn delete_book(&self, id: i64) -> StoreResult<()> {
        delete_row::<BookRow>(&self.books_file, id)
    }

    fn add_wishlist(&self, title: &str, notes: &str) -> StoreResult<i64> {
        validate_title(title)?;

        let mut rows: Vec<WishlistRow> = read_rows(&self.wishlist_file)?;
        let id = next_id(&rows);
        rows.push(WishlistRow {
            id: id.to_string(),
            title: title.to_string(),
            notes: notes.to_string(),
            cover: String::new(),
        });
        write_rows(&self.wishlist_file, &rows)?;

        Ok(id)
    }

    fn list_wishlist(&self) -> StoreResult<Vec<WishlistItem>> {
        let rows: Vec<WishlistRow> = read_rows(&self.wishlist_file)?;

        let mut items: Vec<WishlistItem> = rows
            .into_iter()
            .filter_map(|row| {
                let id = row.parsed_id()?;
                Some(WishlistItem {
                    id,
                    cover: self.assets.resolve(&row.cover),
                    title: row.title,
                    notes: row.notes,
                })
            })
            .collect();

        sort_by_title(&mut items, |w| w.title.as_str());
        Ok(items)
    }

    fn delete_wishlist(&self, id: i64) -> StoreResult<()> {
        delete_row::<WishlistRow>(&self.wishlist_file, id)
    }

    fn move_wishlist_to_books(&self, id: i64, author: &str, year: &str) -> StoreResult<bool> {
        let mut wish_rows: Vec<WishlistRow> = read_rows(&self.wishlist_file)?;
        let Some(index) = wish_rows.iter().position(|r| r.parsed_id() == Some(id)) else {
            return Ok(false);
        };
        let item = wish_rows.remove(index);

        let mut book_rows: Vec<BookRow> = read_rows(&self.books_file)?;
        let book_id = next_id(&book_rows);
        let mut book = BookRow {
            id: book_id.to_string(),
            title: item.title,
            author: author.to_string(),
            year: year.to_string(),
            notes: item.notes,
            cover: String::new(),
        };

        let mut copied = None;
        if let Some(cover) = self.assets.resolve(&item.cover) {
            match self.assets.copy_cover(ItemKind::Book, book_id, &cover) {
                Ok(Some(dest)) => {
                    book.cover = dest.display().to_string();
                    copied = Some(dest);
                }
                Ok(None) => {}
                Err(e) => warn!(id, error = %e, "could not copy wishlist cover"),
            }
        }

        book_rows.push(book);
        write_rows(&self.books_file, &book_rows)?;
        if let Err(e) = write_rows(&self.wishlist_file, &wish_rows) {
            warn!(wishlist_id = id, book_id, error = %e, "wishlist not updated, undoing move");
            book_rows.pop();
            self.undo_move(&book_rows, copied.as_deref());
            return Err(e);
        }

        debug!(wishlist_id = id, book_id, "moved wishlist item to books");
        Ok(true)
    }

    fn set_book_cover(&self, id: i64, source: &Path) -> StoreResult<()> {
        self.set_cover::<BookRow>(&self.books_file, ItemKind::Book, id, source)
    }

    fn set_wishlist_cover(&self, id: i64, source: &Path) -> StoreResult<()> {
        self.set_cover::<WishlistRow>(&self.wishlist_file, ItemKind::Wishlist, id, source)
    }
}
