use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::models::book_ref::BookRef;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
pub const NO_DESCRIPTION: &str = "No description available";
pub const UNKNOWN_PUBLISHER: &str = "Unknown Publisher";
/// Used for both `published_date` and `language`.
pub const UNKNOWN: &str = "Unknown";
pub const PLACEHOLDER_COVER: &str = "/placeholder.svg?height=450&width=300";

/// External catalog a [`Book`] was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "Google Books")]
    GoogleBooks,
    #[serde(rename = "Open Library")]
    OpenLibrary,
}

impl Provider {
    /// Invocation order used by multi-provider searches.
    pub const ALL: [Provider; 2] = [Provider::GoogleBooks, Provider::OpenLibrary];

    /// Short identifier accepted by source filters and the CLI.
    pub fn slug(self) -> &'static str {
        match self {
            Self::GoogleBooks => "google",
            Self::OpenLibrary => "open-library",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::GoogleBooks => "Google Books",
            Self::OpenLibrary => "Open Library",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.slug().eq_ignore_ascii_case(slug.trim()))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Canonical book record every provider response is normalized into.
///
/// All fields are always populated: providers that omit data get the
/// fallback constants of this module. `rating` is `0.0` both for
/// "unrated" and "rated zero"; `preview_link` is the only optional field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub cover_image: String,
    pub rating: f64,
    #[serde(default)]
    pub categories: Vec<String>,
    pub published_date: String,
    pub publisher: String,
    pub language: String,
    pub source: Provider,
    #[serde(default)]
    pub preview_link: Option<String>,
}

impl Book {
    /// A record holding only fallback values, for adapters to fill in.
    pub fn placeholder(id: impl Into<String>, source: Provider) -> Self {
        Self {
            id: id.into(),
            title: UNKNOWN_TITLE.to_string(),
            author: UNKNOWN_AUTHOR.to_string(),
            description: NO_DESCRIPTION.to_string(),
            cover_image: PLACEHOLDER_COVER.to_string(),
            rating: 0.0,
            categories: Vec::new(),
            published_date: UNKNOWN.to_string(),
            publisher: UNKNOWN_PUBLISHER.to_string(),
            language: UNKNOWN.to_string(),
            source,
            preview_link: None,
        }
    }

    /// Parse the provider reference embedded in `id`.
    ///
    /// Fails when the id's provider tag disagrees with `source`.
    pub fn book_ref(&self) -> Result<BookRef> {
        let reference = BookRef::parse(&self.id)?;
        if reference.provider != self.source {
            return Err(CoreError::InvalidBookId(self.id.clone()));
        }
        Ok(reference)
    }

    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }

    pub fn has_preview(&self) -> bool {
        self.preview_link.is_some()
    }
}
