//! Storage contract tests
//!
//! Every test runs against both backends; the contract must hold for each.

use std::fs;
use std::path::Path;

use shelf_core::{open_storage, Backend, LibraryPaths, Settings, Storage, StoreError};
use tempfile::TempDir;

const BACKENDS: [Backend; 2] = [Backend::Sqlite, Backend::Csv];

fn open(dir: &TempDir, backend: Backend) -> Box<dyn Storage> {
    open_storage(backend, &LibraryPaths::new(dir.path()), Settings::default())
        .expect("Failed to open storage")
}

/// A cover file outside the library; not a real image, so it is copied as is
fn cover_file(dir: &Path, name: &str, content: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write cover");
    path
}

#[test]
fn test_add_then_list() {
    for backend in BACKENDS {
        let dir = TempDir::new().unwrap();
        let store = open(&dir, backend);

        let id = store
            .add_book("Berserk", "Kentaro Miura", "1989", "Deluxe")
            .unwrap();
        let books = store.list_books().unwrap();

        assert_eq!(books.len(), 1, "{backend}");
        assert_eq!(books[0].id, id);
        assert_eq!(books[0].title, "Berserk");
        assert_eq!(books[0].author, "Kentaro Miura");
        assert_eq!(books[0].year, "1989");
        assert_eq!(books[0].notes, "Deluxe");
        assert_eq!(books[0].cover, None);
    }
}

#[test]
fn test_empty_title_rejected_before_write() {
    for backend in BACKENDS {
        let dir = TempDir::new().unwrap();
        let store = open(&dir, backend);

        assert!(matches!(
            store.add_book("  ", "", "", ""),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            store.add_wishlist("", "notes"),
            Err(StoreError::Validation(_))
        ));
        assert!(store.list_books().unwrap().is_empty(), "{backend}");
        assert!(store.list_wishlist().unwrap().is_empty(), "{backend}");
    }
}

#[test]
fn test_list_sorted_case_insensitively() {
    for backend in BACKENDS {
        let dir = TempDir::new().unwrap();
        let store = open(&dir, backend);
        for title in ["vagabond", "Akira", "monster", "Berserk"] {
            store.add_wishlist(title, "").unwrap();
        }

        let titles: Vec<_> = store
            .list_wishlist()
            .unwrap()
            .into_iter()
            .map(|w| w.title)
            .collect();
        assert_eq!(titles, vec!["Akira", "Berserk", "monster", "vagabond"], "{backend}");
    }
}

#[test]
fn test_delete_unknown_id_is_noop() {
    for backend in BACKENDS {
        let dir = TempDir::new().unwrap();
        let store = open(&dir, backend);
        store.add_book("Pluto", "", "", "").unwrap();
        store.add_wishlist("Vagabond", "").unwrap();

        store.delete_book(999).unwrap();
        store.delete_wishlist(999).unwrap();

        assert_eq!(store.list_books().unwrap().len(), 1, "{backend}");
        assert_eq!(store.list_wishlist().unwrap().len(), 1, "{backend}");
    }
}

#[test]
fn test_delete_removes_record() {
    for backend in BACKENDS {
        let dir = TempDir::new().unwrap();
        let store = open(&dir, backend);
        let keep = store.add_book("Pluto", "", "", "").unwrap();
        let gone = store.add_book("Monster", "", "", "").unwrap();

        store.delete_book(gone).unwrap();

        let ids: Vec<_> = store.list_books().unwrap().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![keep], "{backend}");
    }
}

#[test]
fn test_move_unknown_id_returns_false() {
    for backend in BACKENDS {
        let dir = TempDir::new().unwrap();
        let store = open(&dir, backend);
        store.add_wishlist("Vagabond", "").unwrap();

        assert!(!store.move_wishlist_to_books(999, "", "").unwrap());
        assert!(store.list_books().unwrap().is_empty(), "{backend}");
        assert_eq!(store.list_wishlist().unwrap().len(), 1, "{backend}");
    }
}

#[test]
fn test_move_carries_fields_and_cover() {
    for backend in BACKENDS {
        let dir = TempDir::new().unwrap();
        let store = open(&dir, backend);
        let source = cover_file(dir.path(), "scan.jpg", b"wishlist cover bytes");

        let id = store.add_wishlist("Vagabond", "vol. 1-3").unwrap();
        store.set_wishlist_cover(id, &source).unwrap();
        let wish_cover = store.list_wishlist().unwrap()[0].cover.clone().unwrap();

        assert!(store.move_wishlist_to_books(id, "Takehiko Inoue", "1998").unwrap());

        assert!(store.list_wishlist().unwrap().is_empty(), "{backend}");
        let books = store.list_books().unwrap();
        assert_eq!(books.len(), 1, "{backend}");
        assert_eq!(books[0].title, "Vagabond");
        assert_eq!(books[0].notes, "vol. 1-3");
        assert_eq!(books[0].author, "Takehiko Inoue");
        assert_eq!(books[0].year, "1998");

        let book_cover = books[0].cover.clone().expect("moved book has a cover");
        assert!(book_cover
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("book_"));
        assert_eq!(fs::read(book_cover).unwrap(), fs::read(wish_cover).unwrap());
    }
}

#[test]
fn test_set_cover_names_asset_after_record() {
    for backend in BACKENDS {
        let dir = TempDir::new().unwrap();
        let store = open(&dir, backend);
        let source = cover_file(dir.path(), "front.png", b"not really a png");

        let id = store.add_book("Akira", "", "", "").unwrap();
        store.set_book_cover(id, &source).unwrap();

        let cover = store.list_books().unwrap()[0].cover.clone().unwrap();
        assert_eq!(cover, dir.path().join("images").join(format!("book_{id}.png")));
        // Undecodable images fall back to a verbatim copy
        assert_eq!(fs::read(&cover).unwrap(), b"not really a png");
    }
}

#[test]
fn test_set_cover_missing_source_or_record_is_noop() {
    for backend in BACKENDS {
        let dir = TempDir::new().unwrap();
        let store = open(&dir, backend);
        let id = store.add_book("Akira", "", "", "").unwrap();
        let source = cover_file(dir.path(), "front.jpg", b"jpeg");

        store
            .set_book_cover(id, &dir.path().join("missing.jpg"))
            .unwrap();
        store.set_book_cover(id, Path::new("")).unwrap();
        store.set_wishlist_cover(42, &source).unwrap();

        assert_eq!(store.list_books().unwrap()[0].cover, None, "{backend}");
        assert!(store.assets().list().unwrap().is_empty(), "{backend}");
    }
}

#[test]
fn test_stale_cover_reads_as_none() {
    for backend in BACKENDS {
        let dir = TempDir::new().unwrap();
        let store = open(&dir, backend);
        let source = cover_file(dir.path(), "front.jpg", b"jpeg");
        let id = store.add_book("Akira", "", "", "").unwrap();
        store.set_book_cover(id, &source).unwrap();

        let cover = store.list_books().unwrap()[0].cover.clone().unwrap();
        fs::remove_file(cover).unwrap();

        assert_eq!(store.list_books().unwrap()[0].cover, None, "{backend}");
    }
}

#[test]
fn test_csv_ids_never_reused() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, Backend::Csv);

    let first = store.add_book("One", "", "", "").unwrap();
    let second = store.add_book("Two", "", "", "").unwrap();
    store.delete_book(first).unwrap();
    let third = store.add_book("Three", "", "", "").unwrap();

    assert_eq!((first, second, third), (1, 2, 3));
}

#[test]
fn test_records_survive_reopen() {
    for backend in BACKENDS {
        let dir = TempDir::new().unwrap();
        {
            let store = open(&dir, backend);
            store.add_book("Berserk", "Kentaro Miura", "", "").unwrap();
            store.add_wishlist("Vagabond", "").unwrap();
        }

        let store = open(&dir, backend);
        assert_eq!(store.list_books().unwrap()[0].title, "Berserk", "{backend}");
        assert_eq!(store.list_wishlist().unwrap()[0].title, "Vagabond", "{backend}");
    }
}
