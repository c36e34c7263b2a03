//! Shelf CLI - manage a personal manga library
//!
//! Provides `shelf book`, `shelf wish`, `shelf backup`, `shelf migrate` and
//! other commands.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use shelf_core::{migrate, Backend, LibraryPaths, Settings};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::archive::{BackupCommands, CoversCommands};
use commands::book::BookCommands;
use commands::settings::SettingsCommands;
use commands::wish::WishCommands;
use commands::{confirm, Library};

#[derive(Parser)]
#[command(name = "shelf")]
#[command(about = "Shelf - personal manga library manager")]
#[command(version)]
struct Cli {
    /// Storage backend (sqlite or csv)
    #[arg(long, global = true, env = "SHELF_STORAGE", default_value = "csv")]
    storage: Backend,

    /// Library directory (defaults to ~/.shelf)
    #[arg(long, global = true, env = "SHELF_HOME", value_name = "DIR")]
    home: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage owned books
    Book {
        #[command(subcommand)]
        action: BookCommands,
    },
    /// Manage the wishlist
    Wish {
        #[command(subcommand)]
        action: WishCommands,
    },
    /// Render a printable listing
    Print {
        /// Which list to render
        #[arg(value_enum)]
        list: ListKind,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Full backups of data and covers
    Backup {
        #[command(subcommand)]
        action: BackupCommands,
    },
    /// Covers-only archives
    Covers {
        #[command(subcommand)]
        action: CoversCommands,
    },
    /// Copy every record into the other storage backend
    Migrate {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommands,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ListKind {
    Books,
    Wishlist,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let paths = match cli.home {
        Some(home) => LibraryPaths::new(home),
        None => LibraryPaths::user()?,
    };
    let settings = Settings::load(&paths.settings());
    debug!(root = %paths.root().display(), backend = %cli.storage, "opening library");
    let library = Library::new(paths, cli.storage, settings);

    match cli.command {
        Commands::Book { action } => commands::book::execute(action, &library),
        Commands::Wish { action } => commands::wish::execute(action, &library),
        Commands::Print { list, output } => run_print(&library, list, output),
        Commands::Backup { action } => commands::archive::execute_backup(action, &library),
        Commands::Covers { action } => commands::archive::execute_covers(action, &library),
        Commands::Migrate { force, json } => run_migrate(&library, force, json),
        Commands::Settings { action } => commands::settings::execute(action, &library),
    }
}

fn run_print(
    library: &Library,
    list: ListKind,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = library.open()?;
    let text = match list {
        ListKind::Books => shelf_core::listing::render_books(&store.list_books()?),
        ListKind::Wishlist => shelf_core::listing::render_wishlist(&store.list_wishlist()?),
    };

    match output {
        Some(path) => {
            std::fs::write(&path, text)?;
            println!("Wrote listing to {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn run_migrate(library: &Library, force: bool, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let from = library.backend();
    let to = from.other();

    if !confirm(&format!("Copy every record from {from} into {to}?"), force)? {
        println!("Cancelled.");
        return Ok(());
    }

    let source = library.open()?;
    let destination = library.open_backend(to)?;
    let report = migrate(&*source, &*destination)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Migrated {} books and {} wishlist items ({} covers) from {from} to {to}.",
        report.books, report.wishlist, report.covers
    );
    if report.cover_failures > 0 {
        println!("{} covers could not be copied.", report.cover_failures);
    }
    if report.skipped > 0 {
        println!("{} records without a title were skipped.", report.skipped);
    }
    println!("Run with --storage {to} (or SHELF_STORAGE={to}) to use the migrated library.");
    Ok(())
}
