//! Provider adapters: one per external catalog, each mapping its native
//! response schema into [`Book`] records.

use async_trait::async_trait;
use bookscout_core::{Book, Provider};
use serde_json::Value;

use crate::error::Result;

pub mod google_books;
pub mod openlibrary;

pub use google_books::GoogleBooksSource;
pub use openlibrary::OpenLibrarySource;

/// Subject used for the "popular books" listing.
pub const POPULAR_SUBJECT: &str = "fiction";

/// A catalog the aggregator and resolver can query.
///
/// Transport and status failures are returned as errors; callers decide
/// whether to absorb them. A response without a result list is `Ok(vec![])`.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn provider(&self) -> Provider;

    /// Free-text search, `limit` records starting at `offset`.
    async fn search(&self, query: &str, limit: usize, offset: usize) -> Result<Vec<Book>>;

    /// Books sharing `category`, used for similar-books and category listings.
    async fn related(&self, category: &str, limit: usize) -> Result<Vec<Book>>;

    /// Full record for a provider-native id.
    async fn fetch_book(&self, native_id: &str) -> Result<Book>;

    async fn popular(&self, limit: usize) -> Result<Vec<Book>> {
        self.related(POPULAR_SUBJECT, limit).await
    }
}

// ─── Mapping helpers ──────────────────────────────────────────────────────────

/// Non-blank string at `key`.
pub(crate) fn non_empty_str<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

pub(crate) fn str_or(v: &Value, key: &str, fallback: &str) -> String {
    non_empty_str(v, key).unwrap_or(fallback).to_string()
}

/// String items of the array at `key`; anything else is an empty list.
pub(crate) fn string_list(v: &Value, key: &str) -> Vec<String> {
    v.get(key)
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// First element of the array at `key`, either a plain string or `{ "name": .. }`.
pub(crate) fn first_name(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|item| item.as_str().or_else(|| item.get("name").and_then(Value::as_str)))
        .filter(|s| !s.trim().is_empty())
        .map(ToOwned::to_owned)
}

/// Authors joined with `", "`, `None` when there are none.
pub(crate) fn join_authors(names: &[String]) -> Option<String> {
    (!names.is_empty()).then(|| names.join(", "))
}

/// Text that is either a plain string or `{ "type": .., "value": .. }`.
pub(crate) fn text_value(v: &Value, key: &str) -> Option<String> {
    let field = v.get(key)?;
    field
        .as_str()
        .or_else(|| field.get("value").and_then(Value::as_str))
        .filter(|s| !s.trim().is_empty())
        .map(ToOwned::to_owned)
}
