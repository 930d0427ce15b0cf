pub mod config;
pub mod error;
pub mod favorites;
pub mod models;

pub use config::{AppConfig, CacheConfig, FavoritesConfig, ProvidersConfig};
pub use error::{CoreError, ExitCode, Result};
pub use favorites::FavoritesStore;
pub use models::*;
