//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::parse_duration;

/// Environment variable overriding `upstream.base_url`.
pub const BASE_URL_ENV: &str = "MLBB_STATS_API_URL";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// MLBB Stats API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the stats API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory for cached API responses
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// How long a cached response stays fresh ("15m", "1h", "90s")
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: String,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Number of ranking records requested per page render
    #[serde(default = "default_ranking_page_size")]
    pub ranking_page_size: u32,
}

fn default_base_url() -> String {
    "https://mlbb-stats.ridwaanhall.com/api/".to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./data/cache")
}

fn default_cache_ttl() -> String {
    "15m".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_ranking_page_size() -> u32 {
    130
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cache_dir: default_cache_dir(),
            cache_ttl: default_cache_ttl(),
            timeout_seconds: default_timeout(),
            ranking_page_size: default_ranking_page_size(),
        }
    }
}

impl UpstreamConfig {
    /// Parsed base URL, always ending in exactly one slash so relative
    /// endpoint paths join beneath it.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let normalized = format!("{}/", self.base_url.trim().trim_end_matches('/'));
        let url = Url::parse(&normalized).map_err(|e| {
            ConfigError::ValidationError(format!("Invalid upstream base_url {:?}: {}", self.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "Upstream base_url must be http or https, got {}",
                url.scheme()
            )));
        }
        Ok(url)
    }

    pub fn cache_ttl(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.cache_ttl).ok_or_else(|| {
            ConfigError::ValidationError(format!("Invalid cache_ttl: {:?}", self.cache_ttl))
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Image proxy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Hosts the image proxy is allowed to fetch from
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,

    /// `max-age` sent with proxied images
    #[serde(default = "default_image_cache_seconds")]
    pub cache_seconds: u64,

    /// Largest upstream image the proxy will relay
    #[serde(default = "default_image_max_bytes")]
    pub max_bytes: usize,
}

fn default_allowed_hosts() -> Vec<String> {
    [
        "akmweb.youngjoygame.com",
        "cdn.id-mpl.com",
        "wsrv.nl",
        "ik.imagekit.io",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_image_cache_seconds() -> u64 {
    3600
}

fn default_image_max_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: default_allowed_hosts(),
            cache_seconds: default_image_cache_seconds(),
            max_bytes: default_image_max_bytes(),
        }
    }
}

impl ImageConfig {
    pub fn is_allowed(&self, host: &str) -> bool {
        self.allowed_hosts
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(host))
    }
}

/// Where a loaded [`AppConfig`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    File,
    /// The file was missing
    Defaults,
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub images: ImageConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            images: ImageConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&contents)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    ///
    /// Does not log: callers usually load config before the subscriber is
    /// installed and report [`ConfigOrigin`] afterwards.
    pub fn load_or_default(path: &Path) -> Result<(Self, ConfigOrigin), ConfigError> {
        if path.exists() {
            return Ok((Self::from_file(path)?, ConfigOrigin::File));
        }

        let mut config = AppConfig::default();
        config.apply_env();
        config.validate()?;
        Ok((config, ConfigOrigin::Defaults))
    }

    /// Apply environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_base_url_override(std::env::var(BASE_URL_ENV).ok());
    }

    fn apply_base_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            self.upstream.base_url = url;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.upstream.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Upstream timeout must be greater than 0".to_string(),
            ));
        }

        if !(1..=200).contains(&self.upstream.ranking_page_size) {
            return Err(ConfigError::ValidationError(format!(
                "ranking_page_size must be between 1 and 200, got {}",
                self.upstream.ranking_page_size
            )));
        }

        if self.images.max_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "images.max_bytes must be greater than 0".to_string(),
            ));
        }

        self.upstream.cache_ttl()?;
        self.upstream.base_url()?;

        Ok(())
    }
}
