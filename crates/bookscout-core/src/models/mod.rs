pub mod book;
pub mod book_ref;
pub mod filters;

pub use book::{
    Book, PLACEHOLDER_COVER, Provider, UNKNOWN, UNKNOWN_AUTHOR, UNKNOWN_PUBLISHER, UNKNOWN_TITLE,
    NO_DESCRIPTION,
};
pub use book_ref::{BookRef, OPEN_LIBRARY_TAG};
pub use filters::{SearchFilters, SourceFilter};
