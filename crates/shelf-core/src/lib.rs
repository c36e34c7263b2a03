//! Shelf Core - storage backends, cover assets, migration and backups
//!
//! This crate provides the storage contract shared by the SQLite and CSV
//! backends, the cover asset store, the migration routine that copies a
//! library between backends, and zip backups.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod assets;
pub mod backup;
pub mod error;
pub mod imaging;
pub mod listing;
pub mod migrate;
pub mod paths;
pub mod record;
pub mod settings;
pub mod storage;
pub mod util;

pub use assets::AssetStore;
pub use error::{StoreError, StoreResult};
pub use migrate::{migrate, MigrationReport};
pub use paths::LibraryPaths;
pub use record::{Book, ItemKind, WishlistItem};
pub use settings::Settings;
pub use storage::{open_storage, Backend, Storage};
