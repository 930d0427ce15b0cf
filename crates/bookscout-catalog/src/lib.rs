//! Bookscout Catalog: provider adapters, multi-source search aggregation,
//! detail and related-book resolution.

pub mod aggregator;
pub mod catalog;
pub mod error;
pub mod http;
pub mod resolver;
pub mod sources;

pub use aggregator::{Aggregator, PAGE_SIZE};
pub use catalog::{Catalog, SearchResponse};
pub use error::{CatalogError, Result};
pub use resolver::Resolver;
pub use sources::CatalogSource;
