//! Copy every record from one backend into the other
//!
//! Both backends share the cover directory, so every source cover is staged
//! into a scratch directory before the destination writes any cover. A cover
//! whose destination name equals its current file keeps that file as is.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{info, warn};

use crate::error::{StoreError, StoreResult};
use crate::record::ItemKind;
use crate::storage::Storage;
use crate::util::same_file;

/// Counts from a finished migration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub books: usize,
    pub wishlist: usize,
    /// Covers set on destination records
    pub covers: usize,
    /// Covers that could not be copied; their records were still migrated
    pub cover_failures: usize,
    /// Records with an empty title, which the destination would reject
    pub skipped: usize,
}

/// A source cover saved before any destination write
struct StagedCover {
    original: PathBuf,
    staged: PathBuf,
}

struct Staging {
    dir: TempDir,
    count: usize,
}

impl Staging {
    fn new() -> StoreResult<Self> {
        Ok(Self {
            dir: TempDir::new()?,
            count: 0,
        })
    }

    fn stage(&mut self, cover: Option<&Path>, report: &mut MigrationReport) -> Option<StagedCover> {
        let original = cover?;
        let ext = original
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let staged = self.dir.path().join(format!("{}{ext}", self.count));
        self.count += 1;

        match fs::copy(original, &staged) {
            Ok(_) => Some(StagedCover {
                original: original.to_path_buf(),
                staged,
            }),
            Err(e) => {
                warn!(cover = %original.display(), error = %e, "could not read cover, migrating record without it");
                report.cover_failures += 1;
                None
            }
        }
    }
}

/// Copy every book and wishlist item of `source` into `destination`
///
/// Records keep their title, author, year, notes and cover; the destination
/// assigns new ids. Nothing in `source` is changed. A cover that cannot be
/// copied is logged and counted without stopping the migration.
///
/// # Errors
/// Returns an error if both sides are the same backend, if `source` cannot
/// be read, or if the destination rejects a record
pub fn migrate(source: &dyn Storage, destination: &dyn Storage) -> StoreResult<MigrationReport> {
    if source.backend() == destination.backend() {
        return Err(StoreError::Validation(format!(
            "Cannot migrate the {} backend into itself",
            source.backend()
        )));
    }

    let books = source.list_books()?;
    let wishlist = source.list_wishlist()?;
    let mut report = MigrationReport::default();

    let mut staging = Staging::new()?;
    let books: Vec<_> = books
        .into_iter()
        .map(|b| {
            let cover = staging.stage(b.cover.as_deref(), &mut report);
            (b, cover)
        })
        .collect();
    let wishlist: Vec<_> = wishlist
        .into_iter()
        .map(|w| {
            let cover = staging.stage(w.cover.as_deref(), &mut report);
            (w, cover)
        })
        .collect();

    for (book, cover) in books {
        if book.title.trim().is_empty() {
            warn!(id = book.id, "skipping book without a title");
            report.skipped += 1;
            continue;
        }
        let id = destination.add_book(&book.title, &book.author, &book.year, &book.notes)?;
        report.books += 1;
        if let Some(cover) = cover {
            let result = destination.set_book_cover(id, cover_source(destination, ItemKind::Book, id, &cover));
            record_cover(result, ItemKind::Book, id, &mut report);
        }
    }

    for (item, cover) in wishlist {
        if item.title.trim().is_empty() {
            warn!(id = item.id, "skipping wishlist item without a title");
            report.skipped += 1;
            continue;
        }
        let id = destination.add_wishlist(&item.title, &item.notes)?;
        report.wishlist += 1;
        if let Some(cover) = cover {
            let result =
                destination.set_wishlist_cover(id, cover_source(destination, ItemKind::Wishlist, id, &cover));
            record_cover(result, ItemKind::Wishlist, id, &mut report);
        }
    }

    info!(
        from = %source.backend(),
        to = %destination.backend(),
        books = report.books,
        wishlist = report.wishlist,
        covers = report.covers,
        "migration finished"
    );
    Ok(report)
}

/// The file to hand to the destination's cover setter: the original when it
/// already sits at the destination's name, otherwise the staged copy
fn cover_source<'a>(
    destination: &dyn Storage,
    kind: ItemKind,
    id: i64,
    cover: &'a StagedCover,
) -> &'a Path {
    let target = destination.assets().cover_path(kind, id, &cover.original);
    if same_file(&target, &cover.original) {
        &cover.original
    } else {
        &cover.staged
    }
}

fn record_cover(result: StoreResult<()>, kind: ItemKind, id: i64, report: &mut MigrationReport) {
    match result {
        Ok(()) => report.covers += 1,
        Err(e) => {
            warn!(%kind, id, error = %e, "could not copy cover");
            report.cover_failures += 1;
        }
    }
}
