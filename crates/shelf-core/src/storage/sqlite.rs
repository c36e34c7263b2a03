//! `SQLite` backend
//!
//! Every mutation commits immediately; a move runs in a single transaction.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::db::Database;
use super::{Backend, Storage};
use crate::assets::AssetStore;
use crate::backup::restore;
use crate::error::StoreResult;
use crate::record::{sort_by_title, validate_title, Book, ItemKind, WishlistItem};

/// Records in a `SQLite` database file
pub struct SqliteStore {
    db: Database,
    path: PathBuf,
    assets: AssetStore,
}

impl SqliteStore {
    /// Open or create the database at `path`
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated
    pub fn open(path: &Path, assets: AssetStore) -> StoreResult<Self> {
        Ok(Self {
            db: Database::open(path)?,
            path: path.to_path_buf(),
            assets,
        })
    }

    fn conn(&self) -> &Connection {
        self.db.connection()
    }

    fn cover_of(&self, stored: Option<String>) -> Option<PathBuf> {
        stored.and_then(|cover| self.assets.resolve(&cover))
    }

    fn get_wishlist(&self, id: i64) -> StoreResult<Option<WishlistItem>> {
        let row = self
            .conn()
            .query_row(
                "SELECT id, title, notes, cover FROM wishlist WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(|(id, title, notes, cover)| WishlistItem {
            id,
            title,
            notes: notes.unwrap_or_default(),
            cover: self.cover_of(cover),
        }))
    }

    fn exists(&self, table: &str, id: i64) -> StoreResult<bool> {
        let found = self
            .conn()
            .query_row(
                &format!("SELECT 1 FROM {table} WHERE id = ?1"),
                params![id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn set_cover(&self, kind: ItemKind, id: i64, source: &Path) -> StoreResult<()> {
        let table = table_for(kind);
        if !self.exists(table, id)? {
            debug!(%kind, id, "no such record, cover not set");
            return Ok(());
        }

        if let Some(dest) = self.assets.import_cover(kind, id, source)? {
            self.conn().execute(
                &format!("UPDATE {table} SET cover = ?1 WHERE id = ?2"),
                params![dest.display().to_string(), id],
            )?;
        }
        Ok(())
    }
}

fn table_for(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Book => "books",
        ItemKind::Wishlist => "wishlist",
    }
}

impl Storage for SqliteStore {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    fn assets(&self) -> &AssetStore {
        &self.assets
    }

    fn data_files(&self) -> Vec<PathBuf> {
        vec![self.path.clone()]
    }

    fn add_book(&self, title: &str, author: &str, year: &str, notes: &str) -> StoreResult<i64> {
        validate_title(title)?;
        self.conn().execute(
            r"
            INSERT INTO books (title, author, year, notes, cover)
            VALUES (?1, ?2, ?3, ?4, NULL)
            ",
            params![title, author, year, notes],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    fn list_books(&self) -> StoreResult<Vec<Book>> {
        let mut stmt = self.conn().prepare(
            r"
            SELECT id, title, author, year, notes, cover
            FROM books
            ORDER BY id
            ",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut books = Vec::new();
        for row in rows {
            let (id, title, author, year, notes, cover) = row?;
            books.push(Book {
                id,
                title,
                author: author.unwrap_or_default(),
                year: year.unwrap_or_default(),
                notes: notes.unwrap_or_default(),
                cover: self.cover_of(cover),
            });
        }

        sort_by_title(&mut books, |b| b.title.as_str());
        Ok(books)
    }

    fn delete_book(&self, id: i64) -> StoreResult<()> {
        self.conn()
            .execute("DELETE FROM books WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn add_wishlist(&self, title: &str, notes: &str) -> StoreResult<i64> {
        validate_title(title)?;
        self.conn().execute(
            "INSERT INTO wishlist (title, notes, cover) VALUES (?1, ?2, NULL)",
            params![title, notes],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    fn list_wishlist(&self) -> StoreResult<Vec<WishlistItem>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, title, notes, cover FROM wishlist ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (id, title, notes, cover) = row?;
            items.push(WishlistItem {
                id,
                title,
                notes: notes.unwrap_or_default(),
                cover: self.cover_of(cover),
            });
        }

        sort_by_title(&mut items, |w| w.title.as_str());
        Ok(items)
    }

    fn delete_wishlist(&self, id: i64) -> StoreResult<()> {
        self.conn()
            .execute("DELETE FROM wishlist WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn move_wishlist_to_books(&self, id: i64, author: &str, year: &str) -> StoreResult<bool> {
        let Some(item) = self.get_wishlist(id)? else {
            return Ok(false);
        };

        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            r"
            INSERT INTO books (title, author, year, notes, cover)
            VALUES (?1, ?2, ?3, ?4, NULL)
            ",
            params![item.title, author, year, item.notes],
        )?;
        let book_id = tx.last_insert_rowid();

        if let Some(cover) = &item.cover {
            match self.assets.copy_cover(ItemKind::Book, book_id, cover) {
                Ok(Some(dest)) => {
                    tx.execute(
                        "UPDATE books SET cover = ?1 WHERE id = ?2",
                        params![dest.display().to_string(), book_id],
                    )?;
                }
                Ok(None) => {}
                Err(e) => warn!(id, error = %e, "could not copy wishlist cover"),
            }
        }

        tx.execute("DELETE FROM wishlist WHERE id = ?1", params![id])?;
        tx.commit()?;

        debug!(wishlist_id = id, book_id, "moved wishlist item to books");
        Ok(true)
    }

    fn set_book_cover(&self, id: i64, source: &Path) -> StoreResult<()> {
        self.set_cover(ItemKind::Book, id, source)
    }

    fn set_wishlist_cover(&self, id: i64, source: &Path) -> StoreResult<()> {
        self.set_cover(ItemKind::Wishlist, id, source)
    }

    fn import_all(&mut self, source: &Path) -> StoreResult<()> {
        // Release the database file before it is replaced, then reopen
        // whatever is on disk afterwards
        self.db = Database::in_memory()?;
        let restored = restore::import_full(
            Backend::Sqlite,
            &self.data_files(),
            &self.assets,
            source,
        );
        self.db = Database::open(&self.path)?;
        restored?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> SqliteStore {
        let assets = AssetStore::new(dir.path().join("images"), Settings::default());
        SqliteStore::open(&dir.path().join("shelf.db"), assets).unwrap()
    }

    #[test]
    fn test_ids_autoincrement() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);

        let first = store.add_book("Berserk", "", "", "").unwrap();
        let second = store.add_book("Monster", "", "", "").unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_null_columns_read_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store
            .conn()
            .execute("INSERT INTO books (title) VALUES ('Pluto')", [])
            .unwrap();

        let books = store.list_books().unwrap();
        assert_eq!(books[0].author, "");
        assert_eq!(books[0].cover, None);
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let dir = TempDir::new().unwrap();
        {
            let store = open(&dir);
            store.add_wishlist("Vagabond", "vol. 1").unwrap();
        }
        let store = open(&dir);
        let items = store.list_wishlist().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].notes, "vol. 1");
    }
}
