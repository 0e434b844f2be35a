//! Hero ranking query parameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timeframe of the ranking window, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RankDays(u8);

impl RankDays {
    pub const OPTIONS: [u8; 5] = [1, 3, 7, 15, 30];

    pub fn new(days: u8) -> Option<Self> {
        Self::OPTIONS.contains(&days).then_some(Self(days))
    }

    /// Parse a query-string value, falling back to the default window.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.trim().parse::<u8>().ok())
            .and_then(Self::new)
            .unwrap_or_default()
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = RankDays> {
        Self::OPTIONS.into_iter().map(RankDays)
    }

    /// "Last 7 days" style label.
    pub fn label(self) -> String {
        format!("Last {} day{}", self.0, if self.0 > 1 { "s" } else { "" })
    }
}

impl Default for RankDays {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<u8> for RankDays {
    type Error = String;

    fn try_from(days: u8) -> Result<Self, Self::Error> {
        Self::new(days).ok_or_else(|| format!("unsupported timeframe: {} days", days))
    }
}

impl From<RankDays> for u8 {
    fn from(days: RankDays) -> Self {
        days.0
    }
}

impl fmt::Display for RankDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ranked tier filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankTier {
    #[default]
    All,
    Epic,
    Legend,
    Mythic,
    Honor,
    Glory,
}

impl RankTier {
    pub const ALL: [RankTier; 6] = [
        RankTier::All,
        RankTier::Epic,
        RankTier::Legend,
        RankTier::Mythic,
        RankTier::Honor,
        RankTier::Glory,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RankTier::All => "all",
            RankTier::Epic => "epic",
            RankTier::Legend => "legend",
            RankTier::Mythic => "mythic",
            RankTier::Honor => "honor",
            RankTier::Glory => "glory",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RankTier::All => "All",
            RankTier::Epic => "Epic",
            RankTier::Legend => "Legend",
            RankTier::Mythic => "Mythic",
            RankTier::Honor => "Honor",
            RankTier::Glory => "Glory",
        }
    }

    /// Parse a query-string value, falling back to the default tier.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for RankTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| format!("unknown rank tier: {}", s))
    }
}

impl fmt::Display for RankTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    PickRate,
    BanRate,
    WinRate,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::PickRate => "pick_rate",
            SortField::BanRate => "ban_rate",
            SortField::WinRate => "win_rate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Query sent to the `hero-rank/` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroRankQuery {
    pub days: RankDays,
    pub rank: RankTier,
    pub size: u32,
    pub index: u32,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
}

impl Default for HeroRankQuery {
    fn default() -> Self {
        Self {
            days: RankDays::default(),
            rank: RankTier::default(),
            size: 20,
            index: 1,
            sort_field: SortField::WinRate,
            sort_order: SortOrder::Desc,
        }
    }
}

impl HeroRankQuery {
    pub fn new(days: RankDays, rank: RankTier, size: u32) -> Self {
        Self {
            days,
            rank,
            size,
            ..Default::default()
        }
    }

    /// Query-string pairs in upstream naming.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("days", self.days.to_string()),
            ("rank", self.rank.to_string()),
            ("size", self.size.to_string()),
            ("index", self.index.to_string()),
            ("sort_field", self.sort_field.as_str().to_string()),
            ("sort_order", self.sort_order.as_str().to_string()),
        ]
    }
}
