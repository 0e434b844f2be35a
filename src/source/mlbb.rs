//! Live MLBB Stats API client.

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use super::{decode_envelope, HeroListPage, HeroRankPage, SourceError, SourcePage, StatsSource};
use crate::fetch::{FetchError, Fetcher};
use crate::models::HeroRankQuery;

/// Client for `https://mlbb-stats.ridwaanhall.com/api/`.
pub struct MlbbClient {
    fetcher: Fetcher,
    base_url: Url,
}

impl MlbbClient {
    /// `base_url` must end with a slash; endpoint paths are joined beneath it.
    pub fn new(fetcher: Fetcher, base_url: Url) -> Self {
        Self { fetcher, base_url }
    }

    pub fn hero_list_url(&self) -> Result<Url, SourceError> {
        self.endpoint("hero-list/")
    }

    pub fn hero_rank_url(&self, query: &HeroRankQuery) -> Result<Url, SourceError> {
        let mut url = self.endpoint("hero-rank/")?;
        url.query_pairs_mut().extend_pairs(query.to_pairs());
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url, SourceError> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{}{}: {}", self.base_url, path, e)).into())
    }

    async fn get_page<T>(&self, url: &Url) -> Result<SourcePage<T>, SourceError>
    where
        T: serde::de::DeserializeOwned,
    {
        let (result, body) = self.fetcher.fetch_text(url).await.map_err(|e| {
            warn!("Upstream request to {} failed: {}", url, e);
            e
        })?;

        let mut page: SourcePage<T> = decode_envelope(&body)?;
        page.fetched_at = Some(result.fetched_at);
        page.from_cache = result.from_cache();

        debug!(
            "Decoded {} records from {} (cached: {})",
            page.records.len(),
            url,
            page.from_cache
        );
        Ok(page)
    }
}

#[async_trait]
impl StatsSource for MlbbClient {
    fn name(&self) -> &'static str {
        "mlbb-stats"
    }

    async fn hero_list(&self) -> Result<HeroListPage, SourceError> {
        let url = self.hero_list_url()?;
        self.get_page(&url).await
    }

    async fn hero_rankings(&self, query: &HeroRankQuery) -> Result<HeroRankPage, SourceError> {
        let url = self.hero_rank_url(query)?;
        self.get_page(&url).await
    }
}
