use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bookscout_core::{CacheConfig, Provider, ProvidersConfig};
use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{CatalogError, Result};

/// Longest slice of an error body kept in a [`CatalogError::Fetch`].
const ERROR_BODY_LIMIT: usize = 200;

/// How stale a cached response may be, by endpoint volatility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Search,
    Detail,
    Browse,
}

#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub search: Duration,
    pub detail: Duration,
    pub browse: Duration,
}

impl CacheTtls {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            search: Duration::from_secs(config.search_ttl_secs),
            detail: Duration::from_secs(config.detail_ttl_secs),
            browse: Duration::from_secs(config.browse_ttl_secs),
        }
    }

    fn for_freshness(&self, freshness: Freshness) -> Duration {
        match freshness {
            Freshness::Search => self.search,
            Freshness::Detail => self.detail,
            Freshness::Browse => self.browse,
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

// ─── CatalogClient ────────────────────────────────────────────────────────────

/// One-shot JSON GETs against the providers, optionally backed by [`DiskCache`].
///
/// There is no retry: a failed call is reported once, tagged with its provider.
pub struct CatalogClient {
    client: reqwest::Client,
    cache: Option<DiskCache>,
    ttls: CacheTtls,
}

impl CatalogClient {
    pub fn new(providers: &ProvidersConfig, cache: &CacheConfig) -> Result<Self> {
        let mut client = Self::uncached(&providers.user_agent, providers.timeout())?;
        if cache.enabled {
            client.cache = Some(DiskCache::new(cache.cache_dir()));
            client.ttls = CacheTtls::from_config(cache);
        }
        Ok(client)
    }

    pub fn uncached(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(CatalogError::Client)?;
        Ok(Self {
            client,
            cache: None,
            ttls: CacheTtls::default(),
        })
    }

    pub fn with_cache(mut self, cache: DiskCache, ttls: CacheTtls) -> Self {
        self.cache = Some(cache);
        self.ttls = ttls;
        self
    }

    pub async fn get_json(
        &self,
        provider: Provider,
        url: &Url,
        freshness: Freshness,
    ) -> Result<Value> {
        let ttl = self.ttls.for_freshness(freshness);
        if let Some(cache) = &self.cache
            && let Some(cached) = cache.get::<Value>(url.as_str(), ttl).await
        {
            debug!(%provider, %url, "cache hit");
            return Ok(cached);
        }

        debug!(%provider, %url, "GET");
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| CatalogError::Transport { provider, source })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CatalogError::Fetch {
                provider,
                status: status.as_u16(),
                message: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let text = resp
            .text()
            .await
            .map_err(|source| CatalogError::Transport { provider, source })?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| CatalogError::Parse(format!("{provider} returned invalid JSON: {e}")))?;

        if let Some(cache) = &self.cache {
            cache.set(url.as_str(), &value).await;
        }
        Ok(value)
    }
}

pub fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| CatalogError::InvalidUrl(format!("{raw}: {e}")))
}

// ─── DiskCache ────────────────────────────────────────────────────────────────

/// JSON file cache keyed by request URL. Read and write failures are misses.
pub struct DiskCache {
    dir: PathBuf,
}

fn cache_key_to_path(dir: &Path, key: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let hash = hasher.finish();
    dir.join(format!("{hash:016x}.json"))
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[derive(Serialize, serde::Deserialize)]
struct CacheEntry<T> {
    stored_at: u64, // Unix timestamp secs
    value: T,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let _ = std::fs::create_dir_all(&dir);
        Self { dir }
    }

    /// Cached value for `key` if it was stored less than `ttl` ago. A stale
    /// entry is deleted on the way out.
    pub async fn get<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        let path = cache_key_to_path(&self.dir, key);
        let data = tokio::fs::read(&path).await.ok()?;
        let entry: CacheEntry<T> = serde_json::from_slice(&data).ok()?;
        if now_secs().saturating_sub(entry.stored_at) >= ttl.as_secs() {
            let _ = tokio::fs::remove_file(&path).await;
            return None;
        }
        Some(entry.value)
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        let path = cache_key_to_path(&self.dir, key);
        let entry = CacheEntry {
            stored_at: now_secs(),
            value,
        };
        if let Ok(data) = serde_json::to_vec(&entry) {
            let _ = tokio::fs::write(&path, data).await;
        }
    }
}
