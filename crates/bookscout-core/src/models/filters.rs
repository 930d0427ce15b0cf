use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::models::book::{Book, Provider};

/// Which providers a search fans out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SourceFilter {
    #[default]
    All,
    Only(Provider),
}

impl SourceFilter {
    pub fn includes(self, provider: Provider) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => only == provider,
        }
    }

    /// Selected providers, in invocation order.
    pub fn providers(self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.includes(*p))
            .collect()
    }
}

impl FromStr for SourceFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        Provider::from_slug(s)
            .map(Self::Only)
            .ok_or_else(|| CoreError::UnknownSource(s.to_string()))
    }
}

impl TryFrom<String> for SourceFilter {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SourceFilter> for String {
    fn from(value: SourceFilter) -> Self {
        value.to_string()
    }
}

impl fmt::Display for SourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(provider) => f.write_str(provider.slug()),
        }
    }
}

/// Post-fetch filters for a search. Defaults filter nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchFilters {
    pub source: SourceFilter,
    /// Case-insensitive substring matched against each category; `"all"` disables it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// `0` (or NaN) disables the floor.
    pub min_rating: f64,
    pub has_preview: bool,
    /// Accepted but not applied by any filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl SearchFilters {
    /// Lowercased category needle, `None` when the category filter is off.
    pub fn category_needle(&self) -> Option<String> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
            .map(str::to_lowercase)
    }

    pub fn matches_category(&self, book: &Book) -> bool {
        match self.category_needle() {
            Some(needle) => book
                .categories
                .iter()
                .any(|c| c.to_lowercase().contains(&needle)),
            None => true,
        }
    }

    pub fn matches_rating(&self, book: &Book) -> bool {
        self.min_rating.is_nan() || self.min_rating <= 0.0 || book.rating >= self.min_rating
    }

    pub fn matches_preview(&self, book: &Book) -> bool {
        !self.has_preview || book.has_preview()
    }

    /// Filter in place order: category, then rating, then preview. Relative order is kept.
    pub fn apply(&self, mut books: Vec<Book>) -> Vec<Book> {
        books.retain(|b| self.matches_category(b));
        books.retain(|b| self.matches_rating(b));
        books.retain(|b| self.matches_preview(b));
        books
    }
}
