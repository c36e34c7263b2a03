//! Printable plain-text listings

use crate::record::{Book, WishlistItem};

const RULE_WIDTH: usize = 40;

/// Render the library as printable text
#[must_use]
pub fn render_books(books: &[Book]) -> String {
    render(
        "Library",
        books.iter().map(|b| {
            let mut line = b.title.clone();
            if !b.author.is_empty() {
                line.push_str(" - ");
                line.push_str(&b.author);
            }
            if !b.year.is_empty() {
                line.push_str(&format!(" ({})", b.year));
            }
            with_notes(line, &b.notes)
        }),
    )
}

/// Render the wishlist as printable text
#[must_use]
pub fn render_wishlist(items: &[WishlistItem]) -> String {
    render(
        "Wishlist",
        items.iter().map(|w| with_notes(w.title.clone(), &w.notes)),
    )
}

fn with_notes(mut line: String, notes: &str) -> String {
    if !notes.is_empty() {
        line.push_str("\n    ");
        line.push_str(notes);
    }
    line
}

// Blocks are separated by a blank line, heading and rule included
fn render(heading: &str, blocks: impl Iterator<Item = String>) -> String {
    let mut parts = vec![heading.to_string(), "=".repeat(RULE_WIDTH)];
    parts.extend(blocks);
    let mut text = parts.join("\n\n");
    text.push('\n');
    text
}
