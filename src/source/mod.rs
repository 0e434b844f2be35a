//! Hero statistics sources.
//!
//! A [`StatsSource`] delivers the two payloads the dashboard consumes: the
//! hero list (names, portraits, relations) and one page of hero rankings.
//! [`MlbbClient`] talks to the live API through the caching fetcher;
//! [`StaticSource`] serves fixtures from memory or disk.

mod fixture;
mod mlbb;

pub use fixture::StaticSource;
pub use mlbb::MlbbClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::fetch::FetchError;
use crate::models::{unwrap_records, ApiEnvelope, HeroListRecord, HeroRankQuery, HeroRankRecord, RecordPage};

/// Errors from a statistics source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Upstream returned code {code}: {message}")]
    Upstream { code: i64, message: String },

    #[error("Malformed upstream payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Fixture error: {0}")]
    Fixture(String),
}

/// Records of one upstream page, unwrapped.
#[derive(Debug, Clone, Serialize)]
pub struct SourcePage<T> {
    pub records: Vec<T>,
    /// Upstream total, falling back to the record count
    pub total: u64,
    /// When the payload was fetched from the network
    pub fetched_at: Option<DateTime<Utc>>,
    pub from_cache: bool,
}

impl<T> SourcePage<T> {
    pub fn new(records: Vec<T>) -> Self {
        let total = records.len() as u64;
        Self {
            records,
            total,
            fetched_at: None,
            from_cache: false,
        }
    }
}

pub type HeroListPage = SourcePage<HeroListRecord>;
pub type HeroRankPage = SourcePage<HeroRankRecord>;

/// Trait for hero statistics sources.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &'static str;

    async fn hero_list(&self) -> Result<HeroListPage, SourceError>;

    async fn hero_rankings(&self, query: &HeroRankQuery) -> Result<HeroRankPage, SourceError>;
}

/// Parse an upstream envelope, reject non-success codes and unwrap the
/// record page.
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<SourcePage<T>, SourceError> {
    let value: serde_json::Value = serde_json::from_str(body)?;

    if let Some(code) = value.get("code").and_then(serde_json::Value::as_i64) {
        if code != 0 && code != 200 {
            let message = value
                .get("message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(SourceError::Upstream { code, message });
        }
    }

    let envelope: ApiEnvelope<RecordPage<T>> = serde_json::from_value(value)?;
    let records = unwrap_records(envelope.data.records);
    let total = envelope.data.total.unwrap_or(records.len() as u64);

    Ok(SourcePage {
        records,
        total,
        fetched_at: None,
        from_cache: false,
    })
}
