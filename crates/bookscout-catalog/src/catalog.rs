use std::sync::Arc;

use bookscout_core::{AppConfig, Book, Provider, SearchFilters};
use serde::Serialize;
use tracing::warn;

use crate::aggregator::{Aggregator, PAGE_SIZE};
use crate::error::Result;
use crate::http::CatalogClient;
use crate::resolver::Resolver;
use crate::sources::openlibrary::OpenLibraryLinks;
use crate::sources::{CatalogSource, GoogleBooksSource, OpenLibrarySource};

pub const SEARCH_FAILED: &str = "Failed to search books. Please try again later.";
pub const INVALID_PAGE: &str = "Page numbers start at 1.";
pub const BOOK_ID_REQUIRED: &str = "Book ID is required";
pub const CATEGORY_REQUIRED: &str = "Category is required";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResponse {
    pub books: Vec<Book>,
    /// Set only when the search could not be attempted at all.
    pub error: Option<String>,
}

impl SearchResponse {
    fn ok(books: Vec<Book>) -> Self {
        Self { books, error: None }
    }

    fn failed(message: &str) -> Self {
        Self {
            books: Vec::new(),
            error: Some(message.to_string()),
        }
    }
}

/// Operations exposed to the UI layer. None of them return `Err`.
pub struct Catalog {
    aggregator: Aggregator,
    resolver: Resolver,
}

impl Catalog {
    /// Both providers, talking to the endpoints in `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = Arc::new(CatalogClient::new(&config.providers, &config.cache)?);
        let google = GoogleBooksSource::new(
            Arc::clone(&client),
            config.providers.google_books_url.clone(),
        );
        let openlibrary = OpenLibrarySource::new(
            client,
            OpenLibraryLinks::new(
                &config.providers.open_library_url,
                &config.providers.covers_url,
            ),
        );
        let sources: Vec<Arc<dyn CatalogSource>> = vec![Arc::new(google), Arc::new(openlibrary)];
        Ok(Self::with_sources(sources))
    }

    pub fn with_sources(sources: Vec<Arc<dyn CatalogSource>>) -> Self {
        Self {
            aggregator: Aggregator::new(sources.clone()),
            resolver: Resolver::new(sources),
        }
    }

    /// One page (1-based) of merged, filtered results.
    pub async fn search(&self, query: &str, filters: &SearchFilters, page: u32) -> SearchResponse {
        if query.trim().is_empty() {
            return SearchResponse::ok(Vec::new());
        }
        if page == 0 {
            return SearchResponse::failed(INVALID_PAGE);
        }

        let offset = (page as usize - 1) * PAGE_SIZE;
        match self.aggregator.search(query, filters, offset).await {
            Ok(books) => SearchResponse::ok(books),
            Err(e) => {
                warn!(query, page, "search failed: {e}");
                SearchResponse::failed(SEARCH_FAILED)
            }
        }
    }

    pub async fn get_by_id(&self, id: &str) -> Option<Book> {
        self.resolver.book_by_id(id).await
    }

    pub async fn get_similar(&self, book: &Book, limit: usize) -> Vec<Book> {
        self.resolver.similar(book, limit).await
    }

    /// Google Books subject listing.
    pub async fn get_by_category(&self, category: &str, limit: usize) -> Vec<Book> {
        let category = category.trim();
        if category.is_empty() {
            return Vec::new();
        }
        let Some(source) = self.aggregator.source_for(Provider::GoogleBooks) else {
            return Vec::new();
        };
        source.related(category, limit).await.unwrap_or_else(|e| {
            warn!(category, "category listing failed: {e}");
            Vec::new()
        })
    }

    pub async fn get_popular(&self, limit: usize) -> Vec<Book> {
        let Some(source) = self.aggregator.source_for(Provider::GoogleBooks) else {
            return Vec::new();
        };
        source.popular(limit).await.unwrap_or_else(|e| {
            warn!("popular listing failed: {e}");
            Vec::new()
        })
    }
}
