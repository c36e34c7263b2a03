//! CLI command handlers
//!
//! Each list (books, wishlist) and each file-level feature (archives,
//! settings) has its own module. Handlers only talk to the storage trait.

pub mod archive;
pub mod book;
pub mod settings;
pub mod wish;

use shelf_core::{open_storage, Backend, LibraryPaths, Settings, Storage, StoreResult};
use std::io::{self, Write};

/// The library selected on the command line
pub struct Library {
    paths: LibraryPaths,
    backend: Backend,
    settings: Settings,
}

impl Library {
    pub fn new(paths: LibraryPaths, backend: Backend, settings: Settings) -> Self {
        Self {
            paths,
            backend,
            settings,
        }
    }

    pub fn paths(&self) -> &LibraryPaths {
        &self.paths
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Open the active backend
    pub fn open(&self) -> StoreResult<Box<dyn Storage>> {
        self.open_backend(self.backend)
    }

    pub fn open_backend(&self, backend: Backend) -> StoreResult<Box<dyn Storage>> {
        open_storage(backend, &self.paths, self.settings.clone())
    }
}

/// Ask a `[y/N]` question on stdin unless `force` is set
pub fn confirm(prompt: &str, force: bool) -> io::Result<bool> {
    if force {
        return Ok(true);
    }

    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// One-line summary used by the list commands
pub fn describe(title: &str, author: &str, year: &str, has_cover: bool) -> String {
    let mut line = title.to_string();
    if !author.is_empty() {
        line.push_str(" - ");
        line.push_str(author);
    }
    if !year.is_empty() {
        line.push_str(" (");
        line.push_str(year);
        line.push(')');
    }
    if has_cover {
        line.push_str(" [cover]");
    }
    line
}
