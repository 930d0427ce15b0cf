use std::sync::Arc;

use async_trait::async_trait;
use bookscout_core::{
    Book, BookRef, NO_DESCRIPTION, PLACEHOLDER_COVER, Provider, UNKNOWN, UNKNOWN_AUTHOR,
    UNKNOWN_PUBLISHER, UNKNOWN_TITLE,
};
use reqwest::Url;
use serde_json::Value;

use crate::error::{CatalogError, Result};
use crate::http::{CatalogClient, Freshness, parse_url};
use crate::sources::{
    CatalogSource, POPULAR_SUBJECT, join_authors, non_empty_str, str_or, string_list,
};

pub const BASE_URL: &str = "https://www.googleapis.com/books/v1/volumes";

/// Maps one volume resource. Returns `None` only when the volume has no id.
pub fn volume_to_book(item: &Value) -> Option<Book> {
    let id = non_empty_str(item, "id")?;
    let info = item.get("volumeInfo").unwrap_or(&Value::Null);

    let cover_image = info
        .pointer("/imageLinks/thumbnail")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(PLACEHOLDER_COVER)
        .to_string();

    Some(Book {
        id: BookRef::new(Provider::GoogleBooks, id).to_id(),
        title: str_or(info, "title", UNKNOWN_TITLE),
        author: join_authors(&string_list(info, "authors"))
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        description: str_or(info, "description", NO_DESCRIPTION),
        cover_image,
        rating: info
            .get("averageRating")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        categories: string_list(info, "categories"),
        published_date: str_or(info, "publishedDate", UNKNOWN),
        publisher: str_or(info, "publisher", UNKNOWN_PUBLISHER),
        language: str_or(info, "language", UNKNOWN),
        source: Provider::GoogleBooks,
        preview_link: non_empty_str(info, "previewLink").map(ToOwned::to_owned),
    })
}

/// Maps a volumes listing. A missing or non-array `items` is zero results.
pub fn volumes_to_books(body: &Value) -> Vec<Book> {
    body.get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(volume_to_book).collect())
        .unwrap_or_default()
}

pub struct GoogleBooksSource {
    client: Arc<CatalogClient>,
    base_url: String,
}

impl GoogleBooksSource {
    pub fn new(client: Arc<CatalogClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn listing_url(&self, params: &[(&str, String)]) -> Result<Url> {
        let mut url = parse_url(&self.base_url)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn volume_url(&self, id: &str) -> Result<Url> {
        let mut url = parse_url(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    async fn list(&self, params: &[(&str, String)], freshness: Freshness) -> Result<Vec<Book>> {
        let url = self.listing_url(params)?;
        let body = self
            .client
            .get_json(Provider::GoogleBooks, &url, freshness)
            .await?;
        Ok(volumes_to_books(&body))
    }
}

#[async_trait]
impl CatalogSource for GoogleBooksSource {
    fn provider(&self) -> Provider {
        Provider::GoogleBooks
    }

    async fn search(&self, query: &str, limit: usize, offset: usize) -> Result<Vec<Book>> {
        self.list(
            &[
                ("q", query.to_string()),
                ("maxResults", limit.to_string()),
                ("startIndex", offset.to_string()),
            ],
            Freshness::Search,
        )
        .await
    }

    async fn related(&self, category: &str, limit: usize) -> Result<Vec<Book>> {
        self.list(
            &[
                ("q", format!("subject:{category}")),
                ("maxResults", limit.to_string()),
            ],
            Freshness::Browse,
        )
        .await
    }

    async fn fetch_book(&self, native_id: &str) -> Result<Book> {
        let native_id = native_id.trim();
        if native_id.is_empty() || native_id.contains('/') {
            return Err(CatalogError::InvalidId(
                Provider::GoogleBooks,
                native_id.to_string(),
            ));
        }

        let url = self.volume_url(native_id)?;
        let body = self
            .client
            .get_json(Provider::GoogleBooks, &url, Freshness::Detail)
            .await?;
        volume_to_book(&body)
            .ok_or_else(|| CatalogError::NotFound(Provider::GoogleBooks, native_id.to_string()))
    }

    async fn popular(&self, limit: usize) -> Result<Vec<Book>> {
        self.list(
            &[
                ("q", format!("subject:{POPULAR_SUBJECT}")),
                ("orderBy", "relevance".to_string()),
                ("maxResults", limit.to_string()),
            ],
            Freshness::Browse,
        )
        .await
    }
}
