//! In-memory source for tests and offline mode.

use std::cmp::Ordering;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use super::{decode_envelope, HeroListPage, HeroRankPage, SourceError, SourcePage, StatsSource};
use crate::models::{HeroListRecord, HeroRankQuery, HeroRankRecord, SortField, SortOrder};

pub const HERO_LIST_FILE: &str = "hero-list.json";
pub const HERO_RANK_FILE: &str = "hero-rank.json";

/// Serves fixed records. Rankings are sorted and truncated per query, the
/// same way the upstream pages them; `days` and `rank` are ignored.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    heroes: Vec<HeroListRecord>,
    rankings: Vec<HeroRankRecord>,
    loaded_at: Option<DateTime<Utc>>,
}

impl StaticSource {
    pub fn new(heroes: Vec<HeroListRecord>, rankings: Vec<HeroRankRecord>) -> Self {
        Self {
            heroes,
            rankings,
            loaded_at: None,
        }
    }

    /// Load `hero-list.json` and `hero-rank.json` (upstream envelope format)
    /// from a directory.
    pub fn from_dir(dir: &Path) -> Result<Self, SourceError> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path)
                .map_err(|e| SourceError::Fixture(format!("{}: {}", path.display(), e)))
        };

        let heroes: SourcePage<HeroListRecord> = decode_envelope(&read(HERO_LIST_FILE)?)?;
        let rankings: SourcePage<HeroRankRecord> = decode_envelope(&read(HERO_RANK_FILE)?)?;

        info!(
            "Loaded {} heroes and {} rankings from {}",
            heroes.records.len(),
            rankings.records.len(),
            dir.display()
        );

        Ok(Self {
            heroes: heroes.records,
            rankings: rankings.records,
            loaded_at: Some(Utc::now()),
        })
    }

    fn sort_key(record: &HeroRankRecord, field: SortField) -> f64 {
        let value = match field {
            SortField::PickRate => record.main_hero_appearance_rate,
            SortField::BanRate => record.main_hero_ban_rate,
            SortField::WinRate => record.main_hero_win_rate,
        };
        value.filter(|v| v.is_finite()).unwrap_or(0.0)
    }

    fn page<T>(&self, records: Vec<T>) -> SourcePage<T> {
        SourcePage {
            fetched_at: self.loaded_at,
            ..SourcePage::new(records)
        }
    }
}

#[async_trait]
impl StatsSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn hero_list(&self) -> Result<HeroListPage, SourceError> {
        Ok(self.page(self.heroes.clone()))
    }

    async fn hero_rankings(&self, query: &HeroRankQuery) -> Result<HeroRankPage, SourceError> {
        let mut records = self.rankings.clone();
        records.sort_by(|a, b| {
            let ordering = Self::sort_key(a, query.sort_field)
                .partial_cmp(&Self::sort_key(b, query.sort_field))
                .unwrap_or(Ordering::Equal);
            match query.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = records.len() as u64;
        let skip = (query.index.max(1) as usize - 1) * query.size as usize;
        let records: Vec<_> = records.into_iter().skip(skip).take(query.size as usize).collect();

        Ok(SourcePage {
            total,
            ..self.page(records)
        })
    }
}
