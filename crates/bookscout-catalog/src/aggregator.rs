use std::sync::Arc;

use bookscout_core::{Book, Provider, SearchFilters};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::{CatalogError, Result};
use crate::sources::CatalogSource;

/// Records requested from each provider per page.
pub const PAGE_SIZE: usize = 20;

/// Fans a search out to the selected sources and merges what comes back.
pub struct Aggregator {
    sources: Vec<Arc<dyn CatalogSource>>,
}

impl Aggregator {
    /// Registration order does not matter: searches invoke and merge
    /// providers in [`Provider::ALL`] order.
    pub fn new(sources: Vec<Arc<dyn CatalogSource>>) -> Self {
        Self { sources }
    }

    pub fn source_for(&self, provider: Provider) -> Option<&Arc<dyn CatalogSource>> {
        self.sources.iter().find(|s| s.provider() == provider)
    }

    /// Searches every source selected by `filters.source`, waiting for all of
    /// them to settle. A failing source contributes nothing; the others still
    /// count. Errors only when a selected provider has no source at all.
    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
        offset: usize,
    ) -> Result<Vec<Book>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let selected = filters
            .source
            .providers()
            .into_iter()
            .map(|provider| {
                self.source_for(provider)
                    .ok_or(CatalogError::SourceUnavailable(provider))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(query, offset, sources = selected.len(), "searching");
        let settled = join_all(
            selected
                .iter()
                .map(|source| source.search(query, PAGE_SIZE, offset)),
        )
        .await;

        let merged = merge_settled(
            selected
                .iter()
                .map(|s| s.provider())
                .zip(settled)
                .collect(),
        );
        Ok(filters.apply(merged))
    }
}

/// Concatenates successful results in the given order, logging and dropping failures.
pub fn merge_settled(results: Vec<(Provider, Result<Vec<Book>>)>) -> Vec<Book> {
    let mut merged = Vec::new();
    for (provider, result) in results {
        match result {
            Ok(books) => merged.extend(books),
            Err(e) => warn!(%provider, "search failed, continuing without it: {e}"),
        }
    }
    merged
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use bookscout_core::SourceFilter;
    use tokio::sync::Barrier;
    use tokio::time::timeout;

    use super::*;

    /// In-process source that records its calls.
    pub(crate) struct FakeSource {
        provider: Provider,
        books: Vec<Book>,
        fail: bool,
        /// Searches wait here until every sibling sharing it has arrived.
        gate: Option<Arc<Barrier>>,
        pub calls: AtomicUsize,
        pub requests: Mutex<Vec<(String, usize, usize)>>,
    }

    impl FakeSource {
        fn build(
            provider: Provider,
            books: Vec<Book>,
            fail: bool,
            gate: Option<Arc<Barrier>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                provider,
                books,
                fail,
                gate,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn new(provider: Provider, books: Vec<Book>) -> Arc<Self> {
            Self::build(provider, books, false, None)
        }

        pub(crate) fn failing(provider: Provider) -> Arc<Self> {
            Self::build(provider, Vec::new(), true, None)
        }

        /// Source whose searches block on `gate` before answering.
        pub(crate) fn gated(
            provider: Provider,
            books: Vec<Book>,
            fail: bool,
            gate: &Arc<Barrier>,
        ) -> Arc<Self> {
            Self::build(provider, books, fail, Some(Arc::clone(gate)))
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn record(&self, query: &str, limit: usize, offset: usize) -> Result<Vec<Book>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .unwrap()
                .push((query.to_string(), limit, offset));
            if self.fail {
                return Err(CatalogError::Fetch {
                    provider: self.provider,
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(self.books.iter().take(limit).cloned().collect())
        }
    }

    #[async_trait]
    impl CatalogSource for FakeSource {
        fn provider(&self) -> Provider {
            self.provider
        }

        async fn search(&self, query: &str, limit: usize, offset: usize) -> Result<Vec<Book>> {
            if let Some(gate) = &self.gate {
                gate.wait().await;
            }
            self.record(query, limit, offset)
        }

        async fn related(&self, category: &str, limit: usize) -> Result<Vec<Book>> {
            self.record(category, limit, 0)
        }

        async fn fetch_book(&self, native_id: &str) -> Result<Book> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CatalogError::NotFound(self.provider, native_id.to_string()));
            }
            self.books
                .iter()
                .find(|b| b.book_ref().is_ok_and(|r| r.native_id == native_id))
                .cloned()
                .ok_or_else(|| CatalogError::NotFound(self.provider, native_id.to_string()))
        }
    }

    pub(crate) fn book(id: &str, provider: Provider) -> Book {
        let mut book = Book::placeholder(id, provider);
        book.title = format!("Title {id}");
        book
    }

    fn as_sources(fakes: &[&Arc<FakeSource>]) -> Vec<Arc<dyn CatalogSource>> {
        fakes
            .iter()
            .map(|f| Arc::clone(*f) as Arc<dyn CatalogSource>)
            .collect()
    }

    fn ids(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.id.as_str()).collect()
    }

    #[tokio::test]
    async fn empty_query_makes_no_calls() {
        let google = FakeSource::new(Provider::GoogleBooks, vec![book("g1", Provider::GoogleBooks)]);
        let ol = FakeSource::new(Provider::OpenLibrary, vec![]);
        let aggregator = Aggregator::new(as_sources(&[&google, &ol]));

        let filters = SearchFilters {
            min_rating: 3.0,
            ..Default::default()
        };
        assert!(aggregator.search("", &filters, 40).await.unwrap().is_empty());
        assert!(aggregator.search("   ", &filters, 0).await.unwrap().is_empty());
        assert_eq!(google.calls() + ol.calls(), 0);
    }

    #[tokio::test]
    async fn one_failure_keeps_the_other_results() {
        let google = FakeSource::new(
            Provider::GoogleBooks,
            vec![
                book("g1", Provider::GoogleBooks),
                book("g2", Provider::GoogleBooks),
                book("g3", Provider::GoogleBooks),
            ],
        );
        let ol = FakeSource::failing(Provider::OpenLibrary);
        let aggregator = Aggregator::new(as_sources(&[&google, &ol]));

        let books = aggregator
            .search("dune", &SearchFilters::default(), 0)
            .await
            .unwrap();

        assert_eq!(ids(&books), vec!["g1", "g2", "g3"]);
        assert_eq!(google.calls(), 1);
        assert_eq!(ol.calls(), 1);
        assert_eq!(
            *google.requests.lock().unwrap(),
            vec![("dune".to_string(), PAGE_SIZE, 0)]
        );
        assert_eq!(
            *ol.requests.lock().unwrap(),
            vec![("dune".to_string(), PAGE_SIZE, 0)]
        );
    }

    // Each source blocks until both have been called, so a sequential
    // fan-out would never get past the first one.
    #[tokio::test]
    async fn providers_are_queried_concurrently() {
        let gate = Arc::new(Barrier::new(2));
        let google = FakeSource::gated(
            Provider::GoogleBooks,
            vec![book("g1", Provider::GoogleBooks), book("g2", Provider::GoogleBooks)],
            false,
            &gate,
        );
        let ol = FakeSource::gated(Provider::OpenLibrary, Vec::new(), true, &gate);
        let aggregator = Aggregator::new(as_sources(&[&google, &ol]));

        let books = timeout(
            Duration::from_secs(2),
            aggregator.search("dune", &SearchFilters::default(), 0),
        )
        .await
        .expect("sources were not queried concurrently")
        .unwrap();

        assert_eq!(ids(&books), vec!["g1", "g2"]);
        assert_eq!(google.calls(), 1);
        assert_eq!(ol.calls(), 1);
    }

    #[tokio::test]
    async fn all_failing_is_empty_not_error() {
        let google = FakeSource::failing(Provider::GoogleBooks);
        let ol = FakeSource::failing(Provider::OpenLibrary);
        let aggregator = Aggregator::new(as_sources(&[&google, &ol]));

        let books = aggregator
            .search("dune", &SearchFilters::default(), 20)
            .await
            .unwrap();
        assert!(books.is_empty());
    }

    #[tokio::test]
    async fn merge_keeps_provider_order() {
        let google = FakeSource::new(
            Provider::GoogleBooks,
            vec![book("g1", Provider::GoogleBooks), book("g2", Provider::GoogleBooks)],
        );
        let ol = FakeSource::new(
            Provider::OpenLibrary,
            vec![book("ol__works_OL1W", Provider::OpenLibrary)],
        );
        // Registered out of order; invocation order still follows Provider::ALL.
        let aggregator = Aggregator::new(as_sources(&[&ol, &google]));

        let books = aggregator
            .search("dune", &SearchFilters::default(), 0)
            .await
            .unwrap();
        assert_eq!(ids(&books), vec!["g1", "g2", "ol__works_OL1W"]);
    }

    #[tokio::test]
    async fn source_filter_selects_one_provider() {
        let google = FakeSource::new(Provider::GoogleBooks, vec![book("g1", Provider::GoogleBooks)]);
        let ol = FakeSource::new(
            Provider::OpenLibrary,
            vec![book("ol__works_OL1W", Provider::OpenLibrary)],
        );
        let aggregator = Aggregator::new(as_sources(&[&google, &ol]));

        let filters = SearchFilters {
            source: SourceFilter::Only(Provider::OpenLibrary),
            ..Default::default()
        };
        let books = aggregator.search("dune", &filters, 0).await.unwrap();
        assert_eq!(ids(&books), vec!["ol__works_OL1W"]);
        assert_eq!(google.calls(), 0);
        assert_eq!(ol.calls(), 1);
    }

    #[tokio::test]
    async fn filters_apply_after_merge() {
        let mut rated = book("g1", Provider::GoogleBooks);
        rated.rating = 4.5;
        rated.preview_link = Some("https://books.google.com/g1".to_string());
        let google = FakeSource::new(
            Provider::GoogleBooks,
            vec![rated, book("g2", Provider::GoogleBooks)],
        );
        let ol = FakeSource::new(
            Provider::OpenLibrary,
            vec![book("ol__works_OL1W", Provider::OpenLibrary)],
        );
        let aggregator = Aggregator::new(as_sources(&[&google, &ol]));

        let filters = SearchFilters {
            min_rating: 4.0,
            ..Default::default()
        };
        let books = aggregator.search("dune", &filters, 0).await.unwrap();
        assert_eq!(ids(&books), vec!["g1"]);
    }

    #[tokio::test]
    async fn missing_source_is_an_error() {
        let google = FakeSource::new(Provider::GoogleBooks, vec![]);
        let aggregator = Aggregator::new(as_sources(&[&google]));

        let filters = SearchFilters {
            source: SourceFilter::Only(Provider::OpenLibrary),
            ..Default::default()
        };
        let err = aggregator.search("dune", &filters, 0).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::SourceUnavailable(Provider::OpenLibrary)
        ));
        assert_eq!(google.calls(), 0);
    }
}
