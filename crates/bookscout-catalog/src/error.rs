use bookscout_core::Provider;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{provider} API error: {status}")]
    Fetch {
        provider: Provider,
        status: u16,
        message: String,
    },

    #[error("{provider} request failed: {source}")]
    Transport {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid id for {0}: {1}")]
    InvalidId(Provider, String),

    #[error("not found at {0}: {1}")]
    NotFound(Provider, String),

    #[error("no source configured for {0}")]
    SourceUnavailable(Provider),
}

impl CatalogError {
    /// Provider the failure is attributed to, when known.
    pub fn provider(&self) -> Option<Provider> {
        match self {
            Self::Fetch { provider, .. } | Self::Transport { provider, .. } => Some(*provider),
            Self::InvalidId(provider, _)
            | Self::NotFound(provider, _)
            | Self::SourceUnavailable(provider) => Some(*provider),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Fetch { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
