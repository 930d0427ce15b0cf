use std::sync::Arc;

use bookscout_core::{Book, BookRef, Provider};
use tracing::{debug, warn};

use crate::sources::CatalogSource;

/// Resolves single books by id and related books for a resolved book.
///
/// Nothing here returns an error: not-found and failed fetches both come
/// back as `None`, failed related lookups as an empty list.
pub struct Resolver {
    sources: Vec<Arc<dyn CatalogSource>>,
}

impl Resolver {
    pub fn new(sources: Vec<Arc<dyn CatalogSource>>) -> Self {
        Self { sources }
    }

    fn source_for(&self, provider: Provider) -> Option<&Arc<dyn CatalogSource>> {
        self.sources.iter().find(|s| s.provider() == provider)
    }

    /// Dispatches on the provider encoded in `id`.
    pub async fn book_by_id(&self, id: &str) -> Option<Book> {
        let reference = match BookRef::parse(id) {
            Ok(reference) => reference,
            Err(e) => {
                debug!("unresolvable id: {e}");
                return None;
            }
        };
        let source = self.source_for(reference.provider)?;

        match source.fetch_book(&reference.native_id).await {
            Ok(book) => Some(book),
            Err(e) => {
                warn!(id, "book lookup failed: {e}");
                None
            }
        }
    }

    /// Up to `limit` books from `book`'s own provider sharing its first category.
    pub async fn similar(&self, book: &Book, limit: usize) -> Vec<Book> {
        let Some(category) = book.primary_category() else {
            return Vec::new();
        };
        if limit == 0 {
            return Vec::new();
        }
        let Some(source) = self.source_for(book.source) else {
            return Vec::new();
        };

        // One extra so dropping the book itself still leaves `limit`.
        match source.related(category, limit + 1).await {
            Ok(books) => books
                .into_iter()
                .filter(|candidate| candidate.id != book.id)
                .take(limit)
                .collect(),
            Err(e) => {
                warn!(id = %book.id, category, "similar books lookup failed: {e}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::tests::{FakeSource, book};

    fn resolver(fakes: &[&Arc<FakeSource>]) -> Resolver {
        Resolver::new(
            fakes
                .iter()
                .map(|f| Arc::clone(*f) as Arc<dyn CatalogSource>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn dispatches_open_library_ids() {
        let google = FakeSource::new(Provider::GoogleBooks, vec![]);
        let ol = FakeSource::new(
            Provider::OpenLibrary,
            vec![book("ol__works_OL45883W", Provider::OpenLibrary)],
        );
        let resolver = resolver(&[&google, &ol]);

        let found = resolver.book_by_id("ol__works_OL45883W").await.unwrap();
        assert_eq!(found.id, "ol__works_OL45883W");
        assert_eq!(google.calls(), 0);
        assert_eq!(ol.calls(), 1);
    }

    #[tokio::test]
    async fn dispatches_other_ids_to_google() {
        let google = FakeSource::new(
            Provider::GoogleBooks,
            vec![book("zyTCAlFPjgYC", Provider::GoogleBooks)],
        );
        let ol = FakeSource::new(Provider::OpenLibrary, vec![]);
        let resolver = resolver(&[&google, &ol]);

        assert!(resolver.book_by_id("zyTCAlFPjgYC").await.is_some());
        assert_eq!(ol.calls(), 0);
    }

    #[tokio::test]
    async fn failures_and_misses_are_none() {
        let google = FakeSource::failing(Provider::GoogleBooks);
        let ol = FakeSource::new(Provider::OpenLibrary, vec![]);
        let resolver = resolver(&[&google, &ol]);

        assert!(resolver.book_by_id("zyTCAlFPjgYC").await.is_none());
        assert!(resolver.book_by_id("ol__works_OL9W").await.is_none());
        assert!(resolver.book_by_id("").await.is_none());
    }

    #[tokio::test]
    async fn similar_without_categories_makes_no_calls() {
        let google = FakeSource::new(Provider::GoogleBooks, vec![book("x", Provider::GoogleBooks)]);
        let resolver = resolver(&[&google]);

        let target = book("g1", Provider::GoogleBooks);
        assert!(resolver.similar(&target, 4).await.is_empty());
        assert_eq!(google.calls(), 0);
    }

    #[tokio::test]
    async fn similar_excludes_original_and_truncates() {
        let mut target = book("g2", Provider::GoogleBooks);
        target.categories = vec!["Fiction".to_string(), "Classics".to_string()];

        let google = FakeSource::new(
            Provider::GoogleBooks,
            ["g1", "g2", "g3", "g4", "g5", "g6"]
                .iter()
                .map(|id| book(id, Provider::GoogleBooks))
                .collect(),
        );
        let ol = FakeSource::new(Provider::OpenLibrary, vec![]);
        let resolver = resolver(&[&google, &ol]);

        let similar = resolver.similar(&target, 4).await;
        let ids: Vec<_> = similar.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g3", "g4", "g5"]);
        assert_eq!(
            *google.requests.lock().unwrap(),
            vec![("Fiction".to_string(), 5, 0)]
        );
        assert_eq!(ol.calls(), 0);
    }

    #[tokio::test]
    async fn similar_uses_the_books_own_provider() {
        let mut target = book("ol__works_OL1W", Provider::OpenLibrary);
        target.categories = vec!["Foxes".to_string()];

        let google = FakeSource::new(Provider::GoogleBooks, vec![]);
        let ol = FakeSource::new(
            Provider::OpenLibrary,
            vec![book("ol__works_OL2W", Provider::OpenLibrary)],
        );
        let resolver = resolver(&[&google, &ol]);

        let similar = resolver.similar(&target, 4).await;
        assert_eq!(similar.len(), 1);
        assert_eq!(google.calls(), 0);
    }

    #[tokio::test]
    async fn similar_failure_is_empty() {
        let mut target = book("g1", Provider::GoogleBooks);
        target.categories = vec!["Fiction".to_string()];
        let google = FakeSource::failing(Provider::GoogleBooks);
        let resolver = resolver(&[&google]);

        assert!(resolver.similar(&target, 4).await.is_empty());
        assert_eq!(google.calls(), 1);
    }
}
