//! Upstream record shapes.
//!
//! Mirrors the JSON consumed from the MLBB Stats API. Every field the
//! dashboard does not strictly need is optional, and rate fields are parsed
//! leniently: a malformed rate becomes `NaN` so the scatter builder can drop
//! the record instead of failing the whole payload.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::RawHeroId;

/// Response envelope shared by all upstream endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    pub data: T,
}

/// A page of wrapped records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPage<T> {
    /// Missing means no records.
    pub records: Option<Vec<WrappedRecord<T>>>,
    pub total: Option<u64>,
}

/// The one-field `{ "data": ... }` wrapper around each record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrappedRecord<T> {
    pub data: T,
}

/// Strip the `data` wrapper from a list of records.
pub fn unwrap_records<T>(records: Option<Vec<WrappedRecord<T>>>) -> Vec<T> {
    records
        .map(|records| records.into_iter().map(|record| record.data).collect())
        .unwrap_or_default()
}

/// Hero name and media URLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeroMedia {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_big: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smallmap: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeroAvatar {
    #[serde(default)]
    pub data: HeroMedia,
}

impl HeroAvatar {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            data: HeroMedia {
                name: Some(name.into()),
                ..Default::default()
            },
        }
    }

    /// The embedded name, if present and non-empty.
    pub fn name(&self) -> Option<&str> {
        self.data.name.as_deref().filter(|name| !name.is_empty())
    }

    /// Best available portrait: big head, then head, then small map icon.
    pub fn portrait_url(&self) -> Option<&str> {
        self.data
            .head_big
            .as_deref()
            .or(self.data.head.as_deref())
            .or(self.data.smallmap.as_deref())
            .filter(|url| !url.is_empty())
    }
}

/// One relation list (assist, strong or weak) of a hero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeroRelationEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default)]
    pub target_hero_id: Option<Vec<RawHeroId>>,
    /// Denormalized target details, index-aligned with `target_hero_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_hero: Option<Vec<Option<HeroAvatar>>>,
}

impl HeroRelationEntry {
    pub fn target_ids(&self) -> &[RawHeroId] {
        self.target_hero_id.as_deref().unwrap_or_default()
    }

    /// Name embedded in the target detail at `index`, if any.
    pub fn target_name(&self, index: usize) -> Option<&str> {
        self.target_hero
            .as_ref()?
            .get(index)?
            .as_ref()?
            .name()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeroRelationSet {
    #[serde(default)]
    pub assist: Option<HeroRelationEntry>,
    #[serde(default)]
    pub strong: Option<HeroRelationEntry>,
    #[serde(default)]
    pub weak: Option<HeroRelationEntry>,
}

impl HeroRelationSet {
    /// The three entries in display order.
    pub fn entries(&self) -> [Option<&HeroRelationEntry>; 3] {
        [self.assist.as_ref(), self.strong.as_ref(), self.weak.as_ref()]
    }
}

/// A record from the `hero-list/` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeroListRecord {
    #[serde(default)]
    pub hero_id: RawHeroId,
    #[serde(default)]
    pub hero: Option<HeroAvatar>,
    #[serde(default)]
    pub relation: Option<HeroRelationSet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroChannel {
    pub id: i64,
}

/// A counter-pick pairing listed under a ranked hero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeroRankSubHero {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_channel: Option<HeroChannel>,
    #[serde(default)]
    pub hero: Option<HeroAvatar>,
    #[serde(default)]
    pub heroid: RawHeroId,
    #[serde(default, deserialize_with = "lenient_rate")]
    pub increase_win_rate: Option<f64>,
}

/// A record from the `hero-rank/` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeroRankRecord {
    #[serde(default)]
    pub main_hero: Option<HeroAvatar>,
    #[serde(default, deserialize_with = "lenient_rate")]
    pub main_hero_appearance_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_rate")]
    pub main_hero_ban_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_hero_channel: Option<HeroChannel>,
    #[serde(default, deserialize_with = "lenient_rate")]
    pub main_hero_win_rate: Option<f64>,
    #[serde(default)]
    pub main_heroid: RawHeroId,
    #[serde(default)]
    pub sub_hero: Option<Vec<HeroRankSubHero>>,
}

impl HeroRankRecord {
    pub fn main_hero_name(&self) -> Option<&str> {
        self.main_hero.as_ref().and_then(HeroAvatar::name)
    }

    /// Embedded name, falling back to the `Hero {id}` placeholder.
    pub fn display_name(&self) -> String {
        self.main_hero_name()
            .map(str::to_string)
            .unwrap_or_else(|| self.main_heroid.placeholder_name())
    }

    pub fn sub_heroes(&self) -> &[HeroRankSubHero] {
        self.sub_hero.as_deref().unwrap_or_default()
    }
}

/// Accept numbers, numeric strings and null. Anything else is kept as
/// `NaN` so downstream finiteness checks drop it.
fn lenient_rate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(n.as_f64().unwrap_or(f64::NAN)),
        Some(Value::String(s)) if s.trim().is_empty() => Some(0.0),
        Some(Value::String(s)) => Some(s.trim().parse().unwrap_or(f64::NAN)),
        Some(_) => Some(f64::NAN),
    })
}
