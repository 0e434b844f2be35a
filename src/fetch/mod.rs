//! HTTP fetching with caching.
//!
//! Fetches JSON payloads from the stats API and keeps each response on disk
//! next to a `.meta.json` sidecar. Entries younger than the cache TTL are
//! served without touching the network. Older entries are revalidated with
//! `If-None-Match`/`If-Modified-Since`, and served stale when the upstream
//! is unreachable.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    LAST_MODIFIED, RETRY_AFTER, USER_AGENT,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};
use url::Url;

#[cfg(test)]
pub(crate) mod test_server;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rate limited by {host}, retry after {retry_after_secs}s")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Content too large: {size} bytes (max {max_size})")]
    ContentTooLarge { size: usize, max_size: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// Failures worth falling back to a stale cache entry for.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(_) | FetchError::RateLimited { .. } => true,
            FetchError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// How a response was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Downloaded and written to the cache
    Miss,
    /// Served from disk within the TTL
    Fresh,
    /// Upstream answered 304; cached body reused
    Revalidated,
    /// Upstream failed; expired body reused
    Stale,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    pub url: Url,

    /// Path where the body is cached
    pub cache_path: PathBuf,

    pub content_type: Option<String>,

    pub content_length: usize,

    /// When the body was last confirmed against the network
    pub fetched_at: DateTime<Utc>,

    pub cache: CacheStatus,
}

impl FetchResult {
    pub fn from_cache(&self) -> bool {
        self.cache != CacheStatus::Miss
    }
}

/// Sidecar stored next to each cached body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub content_type: Option<String>,
    pub content_length: usize,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Directory holding cached responses
    pub cache_dir: PathBuf,

    /// How long cached content is considered fresh
    pub cache_ttl: Duration,

    /// Maximum response size (default 10MB)
    pub max_content_size: usize,

    pub timeout: Duration,

    pub user_agent: String,

    /// Reuse an expired entry when the upstream is down
    pub serve_stale: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./data/cache"),
            cache_ttl: Duration::from_secs(15 * 60),
            max_content_size: 10 * 1024 * 1024,
            timeout: Duration::from_secs(30),
            user_agent: concat!("mlbb-dashboard/", env!("CARGO_PKG_VERSION")).to_string(),
            serve_stale: true,
        }
    }
}

/// Body and sidecar locations for one URL.
#[derive(Debug, Clone, PartialEq)]
struct CachePaths {
    body: PathBuf,
    meta: PathBuf,
}

enum Download {
    NotModified,
    Body {
        bytes: Vec<u8>,
        content_type: Option<String>,
        etag: Option<String>,
        last_modified: Option<String>,
    },
}

/// HTTP fetcher with local caching.
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("mlbb-dashboard")),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetch a URL through the cache.
    pub async fn fetch(&self, url: &Url) -> Result<FetchResult, FetchError> {
        let paths = self.paths_for(url);
        let cached = self.read_metadata(url, &paths).await;

        if let Some(meta) = &cached {
            if self.is_fresh(meta) {
                info!("Serving {} from cache", url);
                return Ok(self.cached_result(url, &paths, meta.clone(), CacheStatus::Fresh));
            }
        }

        match self.download(url, cached.as_ref()).await {
            Ok(Download::NotModified) => {
                let Some(mut meta) = cached else {
                    return Err(FetchError::HttpStatus {
                        status: StatusCode::NOT_MODIFIED.as_u16(),
                        message: "304 without a cached body".to_string(),
                    });
                };
                debug!("{} not modified, extending cache entry", url);
                meta.fetched_at = Utc::now();
                meta.expires_at = Some(self.expiry_from(meta.fetched_at));
                self.write_metadata(&paths, &meta).await?;
                Ok(self.cached_result(url, &paths, meta, CacheStatus::Revalidated))
            }
            Ok(Download::Body {
                bytes,
                content_type,
                etag,
                last_modified,
            }) => {
                let fetched_at = Utc::now();
                let meta = CacheMetadata {
                    url: url.to_string(),
                    fetched_at,
                    content_type,
                    content_length: bytes.len(),
                    etag,
                    last_modified,
                    expires_at: Some(self.expiry_from(fetched_at)),
                };

                if let Some(parent) = paths.body.parent() {
                    fs::create_dir_all(parent).await?;
                }
                fs::write(&paths.body, &bytes).await?;
                self.write_metadata(&paths, &meta).await?;

                Ok(self.cached_result(url, &paths, meta, CacheStatus::Miss))
            }
            Err(e) if self.config.serve_stale && e.is_transient() => match cached {
                Some(meta) => {
                    warn!(
                        "Upstream failed for {} ({}), serving copy from {}",
                        url, e, meta.fetched_at
                    );
                    Ok(self.cached_result(url, &paths, meta, CacheStatus::Stale))
                }
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    /// Fetch a URL and return the body as text.
    pub async fn fetch_text(&self, url: &Url) -> Result<(FetchResult, String), FetchError> {
        let result = self.fetch(url).await?;
        let body = fs::read_to_string(&result.cache_path).await?;
        Ok((result, body))
    }

    /// Remove every cached response. Returns whether anything was deleted.
    pub async fn clear_cache(&self) -> Result<bool, FetchError> {
        if !self.config.cache_dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&self.config.cache_dir).await?;
        info!("Cleared cache at {}", self.config.cache_dir.display());
        Ok(true)
    }

    async fn download(
        &self,
        url: &Url,
        cached: Option<&CacheMetadata>,
    ) -> Result<Download, FetchError> {
        info!("Fetching {}", url);

        let mut request = self.client.get(url.as_str());
        if let Some(meta) = cached {
            if let Some(etag) = &meta.etag {
                request = request.header(IF_NONE_MATCH, etag);
            }
            if let Some(modified) = &meta.last_modified {
                request = request.header(IF_MODIFIED_SINCE, modified);
            }
        }
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            return Ok(Download::NotModified);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(FetchError::RateLimited {
                host: url.host_str().unwrap_or("unknown").to_string(),
                retry_after_secs: retry_after,
            });
        }
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(CONTENT_TYPE);
        let etag = header(ETAG);
        let last_modified = header(LAST_MODIFIED);

        let bytes = response.bytes().await?;
        if bytes.len() > self.config.max_content_size {
            return Err(FetchError::ContentTooLarge {
                size: bytes.len(),
                max_size: self.config.max_content_size,
            });
        }

        Ok(Download::Body {
            bytes: bytes.to_vec(),
            content_type,
            etag,
            last_modified,
        })
    }

    /// Sidecar for `url` if both files are present and the sidecar parses.
    async fn read_metadata(&self, url: &Url, paths: &CachePaths) -> Option<CacheMetadata> {
        if !paths.body.exists() {
            debug!("Cache miss for {}", url);
            return None;
        }

        let content = match fs::read_to_string(&paths.meta).await {
            Ok(content) => content,
            Err(e) => {
                debug!("No cache metadata for {}: {}", url, e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!(
                    "Ignoring unreadable cache metadata {}: {}",
                    paths.meta.display(),
                    e
                );
                None
            }
        }
    }

    async fn write_metadata(&self, paths: &CachePaths, meta: &CacheMetadata) -> Result<(), FetchError> {
        fs::write(&paths.meta, serde_json::to_string_pretty(meta)?).await?;
        Ok(())
    }

    fn is_fresh(&self, meta: &CacheMetadata) -> bool {
        let age = Utc::now().signed_duration_since(meta.fetched_at);
        age.num_seconds() <= self.config.cache_ttl.as_secs() as i64
    }

    fn expiry_from(&self, fetched_at: DateTime<Utc>) -> DateTime<Utc> {
        fetched_at + chrono::Duration::seconds(self.config.cache_ttl.as_secs() as i64)
    }

    fn cached_result(
        &self,
        url: &Url,
        paths: &CachePaths,
        meta: CacheMetadata,
        cache: CacheStatus,
    ) -> FetchResult {
        FetchResult {
            url: url.clone(),
            cache_path: paths.body.clone(),
            content_type: meta.content_type,
            content_length: meta.content_length,
            fetched_at: meta.fetched_at,
            cache,
        }
    }

    /// `{cache_dir}/{host}/{hash}.json` plus its `.meta.json` sidecar.
    fn paths_for(&self, url: &Url) -> CachePaths {
        let dir = self
            .config
            .cache_dir
            .join(url.host_str().unwrap_or("unknown"));
        let hash = url_hash(url);

        CachePaths {
            body: dir.join(format!("{}.json", hash)),
            meta: dir.join(format!("{}.meta.json", hash)),
        }
    }
}

/// First 8 bytes of the SHA-256 of the full URL, hex encoded.
fn url_hash(url: &Url) -> String {
    let digest = Sha256::digest(url.as_str().as_bytes());
    hex::encode(&digest[..8])
}
