//! Book CLI commands
//!
//! Handles: shelf book add/list/delete/cover

use clap::Subcommand;
use std::path::PathBuf;

use super::{confirm, describe, Library};

/// Book commands
#[derive(Subcommand)]
pub enum BookCommands {
    /// Add a book
    Add {
        /// Book title
        title: String,
        /// Author
        #[arg(short, long, default_value = "")]
        author: String,
        /// Publication year
        #[arg(short, long, default_value = "")]
        year: String,
        /// Free-form notes
        #[arg(short, long, default_value = "")]
        notes: String,
        /// Cover image to attach
        #[arg(short, long)]
        cover: Option<PathBuf>,
    },
    /// List all books
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a book
    Delete {
        /// Book ID
        id: i64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Set or replace the cover of a book
    Cover {
        /// Book ID
        id: i64,
        /// Cover image
        image: PathBuf,
    },
}

/// Execute book command
pub fn execute(cmd: BookCommands, library: &Library) -> Result<(), Box<dyn std::error::Error>> {
    let store = library.open()?;

    match cmd {
        BookCommands::Add {
            title,
            author,
            year,
            notes,
            cover,
        } => {
            if let Some(cover) = &cover {
                if !cover.is_file() {
                    return Err(format!("Cover image not found: {}", cover.display()).into());
                }
            }

            let id = store.add_book(&title, &author, &year, &notes)?;
            if let Some(cover) = cover {
                store.set_book_cover(id, &cover)?;
            }
            println!("Added book {id}: {title}");
        }
        BookCommands::List { json } => {
            let books = store.list_books()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&books)?);
            } else if books.is_empty() {
                println!("No books found.");
            } else {
                println!("Books:");
                for b in &books {
                    let line = describe(&b.title, &b.author, &b.year, b.cover.is_some());
                    println!("  {:>4}  {line}", b.id);
                }
            }
        }
        BookCommands::Delete { id, force } => {
            let Some(book) = store.list_books()?.into_iter().find(|b| b.id == id) else {
                println!("No book with ID {id}.");
                return Ok(());
            };

            if !confirm(&format!("Delete book '{}' (ID: {id})?", book.title), force)? {
                println!("Cancelled.");
                return Ok(());
            }

            store.delete_book(id)?;
            println!("Deleted book: {}", book.title);
        }
        BookCommands::Cover { id, image } => {
            if !image.is_file() {
                return Err(format!("Cover image not found: {}", image.display()).into());
            }
            if !store.list_books()?.iter().any(|b| b.id == id) {
                return Err(format!("No book with ID {id}").into());
            }

            store.set_book_cover(id, &image)?;
            println!("Set cover for book {id}");
        }
    }

    Ok(())
}
