use std::sync::Arc;

use async_trait::async_trait;
use bookscout_core::{
    Book, BookRef, NO_DESCRIPTION, PLACEHOLDER_COVER, Provider, UNKNOWN, UNKNOWN_AUTHOR,
    UNKNOWN_PUBLISHER, UNKNOWN_TITLE,
};
use reqwest::Url;
use serde_json::Value;
use tracing::warn;

use crate::error::{CatalogError, Result};
use crate::http::{CatalogClient, Freshness, parse_url};
use crate::sources::{
    CatalogSource, first_name, join_authors, non_empty_str, string_list, text_value,
};

pub const BASE_URL: &str = "https://openlibrary.org";
pub const COVERS_URL: &str = "https://covers.openlibrary.org";

/// Search results use medium covers, detail pages large ones.
const SEARCH_COVER_SIZE: char = 'M';
const DETAIL_COVER_SIZE: char = 'L';

/// Site and cover-CDN roots used to build absolute links.
#[derive(Debug, Clone)]
pub struct OpenLibraryLinks {
    site: String,
    covers: String,
}

impl OpenLibraryLinks {
    pub fn new(site: &str, covers: &str) -> Self {
        Self {
            site: site.trim_end_matches('/').to_string(),
            covers: covers.trim_end_matches('/').to_string(),
        }
    }

    /// Human-facing page of a work or edition key.
    pub fn page(&self, key: &str) -> String {
        format!("{}{key}", self.site)
    }

    pub fn cover(&self, cover_id: i64, size: char) -> String {
        format!("{}/b/id/{cover_id}-{size}.jpg", self.covers)
    }
}

impl Default for OpenLibraryLinks {
    fn default() -> Self {
        Self::new(BASE_URL, COVERS_URL)
    }
}

/// Keys look like `/works/OL45883W`: a leading slash and alphanumeric segments.
pub fn is_valid_key(key: &str) -> bool {
    key.strip_prefix('/').is_some_and(|rest| {
        rest.split('/')
            .all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric()))
    })
}

fn positive_int(v: Option<&Value>) -> Option<i64> {
    v.and_then(Value::as_i64).filter(|n| *n > 0)
}

/// Maps one `search.json` doc. Returns `None` only when the doc has no key.
pub fn search_doc_to_book(doc: &Value, links: &OpenLibraryLinks) -> Option<Book> {
    let key = non_empty_str(doc, "key")?;

    let cover_image = positive_int(doc.get("cover_i"))
        .map(|id| links.cover(id, SEARCH_COVER_SIZE))
        .unwrap_or_else(|| PLACEHOLDER_COVER.to_string());

    Some(Book {
        id: BookRef::new(Provider::OpenLibrary, key).to_id(),
        title: non_empty_str(doc, "title")
            .unwrap_or(UNKNOWN_TITLE)
            .to_string(),
        author: join_authors(&string_list(doc, "author_name"))
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        description: text_value(doc, "description").unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        cover_image,
        // Open Library has no ratings.
        rating: 0.0,
        categories: string_list(doc, "subject"),
        published_date: doc
            .get("first_publish_year")
            .and_then(Value::as_i64)
            .map(|year| year.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        publisher: first_name(doc, "publisher").unwrap_or_else(|| UNKNOWN_PUBLISHER.to_string()),
        language: first_name(doc, "language").unwrap_or_else(|| UNKNOWN.to_string()),
        source: Provider::OpenLibrary,
        preview_link: Some(links.page(key)),
    })
}

/// Maps a `search.json` body. A missing or non-array `docs` is zero results.
pub fn search_docs_to_books(body: &Value, links: &OpenLibraryLinks) -> Vec<Book> {
    body.get("docs")
        .and_then(Value::as_array)
        .map(|docs| {
            docs.iter()
                .filter_map(|doc| search_doc_to_book(doc, links))
                .collect()
        })
        .unwrap_or_default()
}

/// First author key of a work (`authors[].author.key`) or edition (`authors[].key`).
pub fn first_author_key(record: &Value) -> Option<&str> {
    let first = record.get("authors")?.as_array()?.first()?;
    first
        .pointer("/author/key")
        .or_else(|| first.get("key"))
        .and_then(Value::as_str)
        .filter(|k| !k.is_empty())
}

/// Maps a work or edition detail record fetched at `key`.
pub fn detail_to_book(record: &Value, key: &str, author: String, links: &OpenLibraryLinks) -> Book {
    let cover_image = record
        .get("covers")
        .and_then(Value::as_array)
        .and_then(|covers| positive_int(covers.first()))
        .map(|id| links.cover(id, DETAIL_COVER_SIZE))
        .unwrap_or_else(|| PLACEHOLDER_COVER.to_string());

    let language = record
        .get("languages")
        .and_then(Value::as_array)
        .and_then(|langs| langs.first())
        .and_then(|lang| lang.get("key"))
        .and_then(Value::as_str)
        .map(|k| k.trim_start_matches("/languages/").to_string())
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string());

    let published_date = non_empty_str(record, "publish_date")
        .or_else(|| non_empty_str(record, "first_publish_date"))
        .unwrap_or(UNKNOWN)
        .to_string();

    Book {
        id: BookRef::new(Provider::OpenLibrary, key).to_id(),
        title: non_empty_str(record, "title")
            .unwrap_or(UNKNOWN_TITLE)
            .to_string(),
        author,
        description: text_value(record, "description")
            .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        cover_image,
        rating: 0.0,
        categories: string_list(record, "subjects"),
        published_date,
        publisher: first_name(record, "publishers")
            .unwrap_or_else(|| UNKNOWN_PUBLISHER.to_string()),
        language,
        source: Provider::OpenLibrary,
        preview_link: Some(links.page(key)),
    }
}

pub struct OpenLibrarySource {
    client: Arc<CatalogClient>,
    links: OpenLibraryLinks,
}

impl OpenLibrarySource {
    pub fn new(client: Arc<CatalogClient>, links: OpenLibraryLinks) -> Self {
        Self { client, links }
    }

    fn search_url(&self, params: &[(&str, String)]) -> Result<Url> {
        let mut url = parse_url(&format!("{}/search.json", self.links.site))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn record_url(&self, key: &str) -> Result<Url> {
        if !is_valid_key(key) {
            return Err(CatalogError::InvalidId(Provider::OpenLibrary, key.to_string()));
        }
        parse_url(&format!("{}{key}.json", self.links.site))
    }

    async fn list(&self, params: &[(&str, String)]) -> Result<Vec<Book>> {
        let url = self.search_url(params)?;
        let body = self
            .client
            .get_json(Provider::OpenLibrary, &url, Freshness::Search)
            .await?;
        Ok(search_docs_to_books(&body, &self.links))
    }

    /// Display name of an author key such as `/authors/OL34184A`.
    pub async fn fetch_author_name(&self, author_key: &str) -> Result<String> {
        let url = self.record_url(author_key)?;
        let body = self
            .client
            .get_json(Provider::OpenLibrary, &url, Freshness::Detail)
            .await?;
        Ok(non_empty_str(&body, "name")
            .or_else(|| non_empty_str(&body, "personal_name"))
            .unwrap_or(UNKNOWN_AUTHOR)
            .to_string())
    }
}

#[async_trait]
impl CatalogSource for OpenLibrarySource {
    fn provider(&self) -> Provider {
        Provider::OpenLibrary
    }

    async fn search(&self, query: &str, limit: usize, offset: usize) -> Result<Vec<Book>> {
        self.list(&[
            ("q", query.to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ])
        .await
    }

    async fn related(&self, category: &str, limit: usize) -> Result<Vec<Book>> {
        self.list(&[("q", category.to_string()), ("limit", limit.to_string())])
            .await
    }

    async fn fetch_book(&self, native_id: &str) -> Result<Book> {
        let url = self.record_url(native_id)?;
        let record = self
            .client
            .get_json(Provider::OpenLibrary, &url, Freshness::Detail)
            .await?;
        if !record.is_object() {
            return Err(CatalogError::NotFound(
                Provider::OpenLibrary,
                native_id.to_string(),
            ));
        }

        // The author lookup is best effort; the detail stands on its own.
        let author = match first_author_key(&record) {
            Some(author_key) => match self.fetch_author_name(author_key).await {
                Ok(name) => name,
                Err(e) => {
                    warn!(author_key, "author lookup failed: {e}");
                    UNKNOWN_AUTHOR.to_string()
                }
            },
            None => UNKNOWN_AUTHOR.to_string(),
        };

        Ok(detail_to_book(&record, native_id, author, &self.links))
    }
}
