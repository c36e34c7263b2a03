//! Backup and covers archive commands
//!
//! Handles: shelf backup export/import, shelf covers export/import

use clap::Subcommand;
use std::path::PathBuf;

use super::{confirm, Library};

/// Full backup commands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Write records and covers to a zip archive
    Export {
        /// Archive to create
        archive: PathBuf,
    },
    /// Replace the library with the contents of a backup
    Import {
        /// Archive to restore
        archive: PathBuf,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Covers-only archive commands
#[derive(Subcommand)]
pub enum CoversCommands {
    /// Write every cover to a zip archive
    Export {
        /// Archive to create
        archive: PathBuf,
    },
    /// Add the covers from an archive to the library
    Import {
        /// Archive to read
        archive: PathBuf,
    },
}

/// Execute backup command
pub fn execute_backup(
    cmd: BackupCommands,
    library: &Library,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = library.open()?;

    match cmd {
        BackupCommands::Export { archive } => {
            store.export_all(&archive)?;
            println!("Exported backup to {}", archive.display());
        }
        BackupCommands::Import { archive, force } => {
            if !archive.is_file() {
                return Err(format!("Backup not found: {}", archive.display()).into());
            }
            let prompt = format!(
                "Replace the {} library with {}?",
                library.backend(),
                archive.display()
            );
            if !confirm(&prompt, force)? {
                println!("Cancelled.");
                return Ok(());
            }

            store.import_all(&archive)?;
            println!("Restored backup from {}", archive.display());
        }
    }

    Ok(())
}

/// Execute covers command
pub fn execute_covers(
    cmd: CoversCommands,
    library: &Library,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = library.open()?;

    match cmd {
        CoversCommands::Export { archive } => {
            let count = store.export_covers(&archive)?;
            println!("Exported {count} covers to {}", archive.display());
        }
        CoversCommands::Import { archive } => {
            let count = store.import_covers(&archive)?;
            println!("Imported {count} covers from {}", archive.display());
        }
    }

    Ok(())
}
