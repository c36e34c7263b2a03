//! Library records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{StoreError, StoreResult};

/// Which list a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Book,
    Wishlist,
}

impl ItemKind {
    /// Prefix used when naming cover assets (`book_12.jpg`, `wish_3.png`)
    #[must_use]
    pub fn asset_prefix(self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Wishlist => "wish",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Book => write!(f, "book"),
            Self::Wishlist => write!(f, "wishlist"),
        }
    }
}

/// An owned item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Store-assigned identifier
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub author: String,
    /// Free text, not validated as a number
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub notes: String,
    /// Cover asset, present only when the file exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<PathBuf>,
}

/// A desired item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    /// Store-assigned identifier
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    /// Cover asset, present only when the file exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<PathBuf>,
}

/// Reject empty titles before anything is written
///
/// # Errors
/// Returns a validation error if the title is empty or whitespace
pub fn validate_title(title: &str) -> StoreResult<()> {
    if title.trim().is_empty() {
        return Err(StoreError::Validation("Title cannot be empty".to_string()));
    }
    Ok(())
}

/// Stable case-insensitive sort by title; ties keep their incoming order
pub fn sort_by_title<T>(items: &mut [T], title: impl Fn(&T) -> &str) {
    items.sort_by_cached_key(|item| title(item).to_lowercase());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Berserk").is_ok());
        assert!(matches!(
            validate_title(""),
            Err(StoreError::Validation(_))
        ));
        assert!(validate_title("   ").is_err());
    }

    #[test]
    fn test_sort_by_title_case_insensitive_and_stable() {
        let mut titles = vec!["beta", "Alpha", "", "alpha", "Gamma"];
        sort_by_title(&mut titles, |t| *t);
        assert_eq!(titles, vec!["", "Alpha", "alpha", "beta", "Gamma"]);
    }

    #[test]
    fn test_asset_prefix() {
        assert_eq!(ItemKind::Book.asset_prefix(), "book");
        assert_eq!(ItemKind::Wishlist.asset_prefix(), "wish");
        assert_eq!(ItemKind::Wishlist.to_string(), "wishlist");
    }

    #[test]
    fn test_book_json_omits_missing_cover() {
        let book = Book {
            id: 1,
            title: "Berserk".to_string(),
            author: "Kentaro Miura".to_string(),
            year: "1989".to_string(),
            notes: String::new(),
            cover: None,
        };
        let json = serde_json::to_string(&book).unwrap();
        assert!(!json.contains("cover"));
    }
}
