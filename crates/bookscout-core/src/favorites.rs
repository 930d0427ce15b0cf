//! Per-user favorites, persisted as `favorites-<user>.json`.
//!
//! Stored books are owned copies: re-fetching a title later never
//! changes what was saved.

use std::fs;
use std::path::PathBuf;

use tracing::warn;

use crate::error::{CoreError, Result};
use crate::models::Book;

pub struct FavoritesStore {
    dir: PathBuf,
}

impl FavoritesStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, user_id: &str) -> Result<PathBuf> {
        let valid = !user_id.is_empty()
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
            && !user_id.starts_with('.');
        if !valid {
            return Err(CoreError::ValidationError(format!(
                "invalid user id: {user_id:?}"
            )));
        }
        Ok(self.dir.join(format!("favorites-{user_id}.json")))
    }

    /// All favorites of `user_id`, in the order they were added.
    pub fn list(&self, user_id: &str) -> Result<Vec<Book>> {
        let path = self.path_for(user_id)?;
        if !path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&path)?;
        match serde_json::from_str(&contents) {
            Ok(books) => Ok(books),
            Err(e) => {
                warn!("ignoring unreadable favorites file {}: {e}", path.display());
                Ok(Vec::new())
            }
        }
    }

    /// Returns `false` when a book with the same id is already saved.
    pub fn add(&self, user_id: &str, book: &Book) -> Result<bool> {
        let mut books = self.list(user_id)?;
        if books.iter().any(|b| b.id == book.id) {
            return Ok(false);
        }
        books.push(book.clone());
        self.save(user_id, &books)?;
        Ok(true)
    }

    /// Returns `false` when no favorite had `book_id`.
    pub fn remove(&self, user_id: &str, book_id: &str) -> Result<bool> {
        let mut books = self.list(user_id)?;
        let before = books.len();
        books.retain(|b| b.id != book_id);
        if books.len() == before {
            return Ok(false);
        }
        self.save(user_id, &books)?;
        Ok(true)
    }

    pub fn is_favorite(&self, user_id: &str, book_id: &str) -> Result<bool> {
        Ok(self.list(user_id)?.iter().any(|b| b.id == book_id))
    }

    fn save(&self, user_id: &str, books: &[Book]) -> Result<()> {
        let path = self.path_for(user_id)?;
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(books)?;
        fs::write(path, json)?;
        Ok(())
    }
}
