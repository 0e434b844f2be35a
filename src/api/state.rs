use std::sync::Arc;

use crate::config::{AppConfig, ConfigError};
use crate::render::PageMeta;
use crate::source::StatsSource;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn StatsSource>,
    /// Client for the image proxy; API calls go through the source.
    pub http: reqwest::Client,
    pub config: Arc<AppConfig>,
    pub page: Arc<PageMeta>,
}

impl AppState {
    pub fn new(source: Arc<dyn StatsSource>, config: Arc<AppConfig>) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream.timeout())
            .user_agent(concat!("mlbb-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::ValidationError(format!("HTTP client: {}", e)))?;

        let page = PageMeta {
            source_url: config.upstream.base_url()?.to_string(),
            cache_window: config.upstream.cache_ttl.clone(),
        };

        Ok(Self {
            source,
            http,
            config,
            page: Arc::new(page),
        })
    }
}
