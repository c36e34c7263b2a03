//! Wishlist CLI commands
//!
//! Handles: shelf wish add/list/delete/cover/move

use clap::Subcommand;
use std::path::PathBuf;

use super::{confirm, describe, Library};

/// Wishlist commands
#[derive(Subcommand)]
pub enum WishCommands {
    /// Add a wishlist item
    Add {
        /// Title
        title: String,
        /// Free-form notes
        #[arg(short, long, default_value = "")]
        notes: String,
        /// Cover image to attach
        #[arg(short, long)]
        cover: Option<PathBuf>,
    },
    /// List the wishlist
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a wishlist item
    Delete {
        /// Wishlist item ID
        id: i64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Set or replace the cover of a wishlist item
    Cover {
        /// Wishlist item ID
        id: i64,
        /// Cover image
        image: PathBuf,
    },
    /// Move a wishlist item into the library
    Move {
        /// Wishlist item ID
        id: i64,
        /// Author of the new book
        #[arg(short, long, default_value = "")]
        author: String,
        /// Publication year of the new book
        #[arg(short, long, default_value = "")]
        year: String,
    },
}

/// Execute wishlist command
pub fn execute(cmd: WishCommands, library: &Library) -> Result<(), Box<dyn std::error::Error>> {
    let store = library.open()?;

    match cmd {
        WishCommands::Add { title, notes, cover } => {
            if let Some(cover) = &cover {
                if !cover.is_file() {
                    return Err(format!("Cover image not found: {}", cover.display()).into());
                }
            }

            let id = store.add_wishlist(&title, &notes)?;
            if let Some(cover) = cover {
                store.set_wishlist_cover(id, &cover)?;
            }
            println!("Added wishlist item {id}: {title}");
        }
        WishCommands::List { json } => {
            let items = store.list_wishlist()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("Wishlist is empty.");
            } else {
                println!("Wishlist:");
                for w in &items {
                    println!("  {:>4}  {}", w.id, describe(&w.title, "", "", w.cover.is_some()));
                    if !w.notes.is_empty() {
                        println!("        {}", w.notes);
                    }
                }
            }
        }
        WishCommands::Delete { id, force } => {
            let Some(item) = store.list_wishlist()?.into_iter().find(|w| w.id == id) else {
                println!("No wishlist item with ID {id}.");
                return Ok(());
            };

            if !confirm(&format!("Delete wishlist item '{}' (ID: {id})?", item.title), force)? {
                println!("Cancelled.");
                return Ok(());
            }

            store.delete_wishlist(id)?;
            println!("Deleted wishlist item: {}", item.title);
        }
        WishCommands::Cover { id, image } => {
            if !image.is_file() {
                return Err(format!("Cover image not found: {}", image.display()).into());
            }
            if !store.list_wishlist()?.iter().any(|w| w.id == id) {
                return Err(format!("No wishlist item with ID {id}").into());
            }

            store.set_wishlist_cover(id, &image)?;
            println!("Set cover for wishlist item {id}");
        }
        WishCommands::Move { id, author, year } => {
            if !store.move_wishlist_to_books(id, &author, &year)? {
                return Err(format!("No wishlist item with ID {id}").into());
            }
            println!("Moved wishlist item {id} to the library");
        }
    }

    Ok(())
}
