use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::models::book::Provider;

/// Prefix marking an Open Library id.
pub const OPEN_LIBRARY_TAG: &str = "ol_";

/// Provider of origin plus the provider's own identifier.
///
/// Open Library keys are path fragments (`/works/OL45883W`), so their
/// external form swaps `/` for `_` and carries [`OPEN_LIBRARY_TAG`].
/// Google Books volume ids are used verbatim. [`BookRef::to_id`] and
/// [`BookRef::parse`] are the only places that know about this encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookRef {
    pub provider: Provider,
    pub native_id: String,
}

impl BookRef {
    pub fn new(provider: Provider, native_id: impl Into<String>) -> Self {
        Self {
            provider,
            native_id: native_id.into(),
        }
    }

    pub fn to_id(&self) -> String {
        match self.provider {
            Provider::GoogleBooks => self.native_id.clone(),
            Provider::OpenLibrary => {
                format!("{OPEN_LIBRARY_TAG}{}", self.native_id.replace('/', "_"))
            }
        }
    }

    pub fn parse(id: &str) -> Result<Self> {
        let id = id.trim();
        if id.is_empty() {
            return Err(CoreError::InvalidBookId(id.to_string()));
        }

        match id.strip_prefix(OPEN_LIBRARY_TAG) {
            Some("") => Err(CoreError::InvalidBookId(id.to_string())),
            Some(key) => Ok(Self::new(Provider::OpenLibrary, key.replace('_', "/"))),
            None => Ok(Self::new(Provider::GoogleBooks, id)),
        }
    }
}

impl FromStr for BookRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for BookRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_library_key_round_trip() {
        let original = BookRef::new(Provider::OpenLibrary, "/works/OL45883W");
        let id = original.to_id();
        assert_eq!(id, "ol__works_OL45883W");

        let parsed = BookRef::parse(&id).unwrap();
        assert_eq!(parsed.provider, Provider::OpenLibrary);
        assert_eq!(parsed.native_id, "/works/OL45883W");
    }

    #[test]
    fn test_google_id_is_verbatim() {
        let parsed: BookRef = "zyTCAlFPjgYC".parse().unwrap();
        assert_eq!(parsed.provider, Provider::GoogleBooks);
        assert_eq!(parsed.native_id, "zyTCAlFPjgYC");
        assert_eq!(parsed.to_id(), "zyTCAlFPjgYC");
    }

    #[test]
    fn test_tag_only_stripped_once() {
        let parsed = BookRef::parse("ol__books_OL7353617M").unwrap();
        assert_eq!(parsed.native_id, "/books/OL7353617M");
    }

    #[test]
    fn test_rejects_empty_ids() {
        assert!(BookRef::parse("").is_err());
        assert!(BookRef::parse("   ").is_err());
        assert!(BookRef::parse("ol_").is_err());
    }
}
