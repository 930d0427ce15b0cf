use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Root application configuration, loaded from `~/.config/bookscout/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub providers: ProvidersConfig,
    pub cache: CacheConfig,
    pub favorites: FavoritesConfig,
}

/// Endpoints of the two catalogs plus transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub google_books_url: String,
    pub open_library_url: String,
    pub covers_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    pub search_ttl_secs: u64,
    pub detail_ttl_secs: u64,
    pub browse_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FavoritesConfig {
    pub directory: String,
    pub default_user: String,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            google_books_url: "https://www.googleapis.com/books/v1/volumes".to_string(),
            open_library_url: "https://openlibrary.org".to_string(),
            covers_url: "https://covers.openlibrary.org".to_string(),
            user_agent: concat!("bookscout/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 15,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
            search_ttl_secs: 60 * 60,
            detail_ttl_secs: 24 * 60 * 60,
            browse_ttl_secs: 12 * 60 * 60,
        }
    }
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("bookscout")
            .join("favorites");

        Self {
            directory: data_dir.to_string_lossy().to_string(),
            default_user: "guest".to_string(),
        }
    }
}

impl ProvidersConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CacheConfig {
    /// Cache directory, defaulting to `<cache dir>/bookscout/http`.
    pub fn cache_dir(&self) -> PathBuf {
        match &self.directory {
            Some(dir) => PathBuf::from(dir),
            None => dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join("bookscout")
                .join("http"),
        }
    }
}

impl AppConfig {
    /// Standard config file path: `~/.config/bookscout/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("BOOKSCOUT_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("bookscout")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("providers.google_books_url", &self.providers.google_books_url),
            ("providers.open_library_url", &self.providers.open_library_url),
            ("providers.covers_url", &self.providers.covers_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(CoreError::ConfigError(format!(
                    "{name} must be an http(s) URL, got {url:?}"
                )));
            }
        }
        if self.favorites.default_user.trim().is_empty() {
            return Err(CoreError::ConfigError(
                "favorites.default_user must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn favorites_dir(&self) -> PathBuf {
        PathBuf::from(&self.favorites.directory)
    }
}
