//! Derived, per-request analytics types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{HeroId, HeroRankRecord, HeroRelationSet, RawHeroId};

/// Scatter-plot quadrant relative to the dataset's mean pick and win rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegionKey {
    HighPickHighWin,
    HighPickLowWin,
    LowPickHighWin,
    LowPickLowWin,
}

impl RegionKey {
    pub const ALL: [RegionKey; 4] = [
        RegionKey::HighPickHighWin,
        RegionKey::HighPickLowWin,
        RegionKey::LowPickHighWin,
        RegionKey::LowPickLowWin,
    ];

    pub fn from_axes(pick_high: bool, win_high: bool) -> Self {
        match (pick_high, win_high) {
            (true, true) => RegionKey::HighPickHighWin,
            (true, false) => RegionKey::HighPickLowWin,
            (false, true) => RegionKey::LowPickHighWin,
            (false, false) => RegionKey::LowPickLowWin,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RegionKey::HighPickHighWin => "highPickHighWin",
            RegionKey::HighPickLowWin => "highPickLowWin",
            RegionKey::LowPickHighWin => "lowPickHighWin",
            RegionKey::LowPickLowWin => "lowPickLowWin",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RegionKey::HighPickHighWin => "High Pick / High Win",
            RegionKey::HighPickLowWin => "High Pick / Low Win",
            RegionKey::LowPickHighWin => "Low Pick / High Win",
            RegionKey::LowPickLowWin => "Low Pick / Low Win",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            RegionKey::HighPickHighWin => "#34d399",
            RegionKey::HighPickLowWin => "#fb7185",
            RegionKey::LowPickHighWin => "#60a5fa",
            RegionKey::LowPickLowWin => "#fbbf24",
        }
    }

    fn bit(self) -> u8 {
        match self {
            RegionKey::HighPickHighWin => 1,
            RegionKey::HighPickLowWin => 1 << 1,
            RegionKey::LowPickHighWin => 1 << 2,
            RegionKey::LowPickLowWin => 1 << 3,
        }
    }
}

impl FromStr for RegionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|region| region.as_str() == s)
            .ok_or_else(|| format!("unknown region: {}", s))
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selection of quadrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionSet {
    mask: u8,
}

impl RegionSet {
    const FULL: u8 = 0b1111;

    pub fn empty() -> Self {
        Self { mask: 0 }
    }

    pub fn all() -> Self {
        Self { mask: Self::FULL }
    }

    pub fn insert(&mut self, region: RegionKey) {
        self.mask |= region.bit();
    }

    pub fn contains(self, region: RegionKey) -> bool {
        self.mask & region.bit() != 0
    }

    /// Same set with `region` flipped.
    pub fn toggled(self, region: RegionKey) -> Self {
        Self {
            mask: self.mask ^ region.bit(),
        }
    }

    pub fn is_all(self) -> bool {
        self.mask == Self::FULL
    }

    pub fn is_empty(self) -> bool {
        self.mask == 0
    }

    pub fn len(self) -> usize {
        self.mask.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = RegionKey> {
        RegionKey::ALL
            .into_iter()
            .filter(move |region| self.contains(*region))
    }

    /// Parse a comma-separated selection. `None` (parameter absent) selects
    /// every region; an empty string selects none. Unknown keys are ignored.
    pub fn parse_param(value: Option<&str>) -> Self {
        match value {
            None => Self::all(),
            Some(list) => list
                .split(',')
                .filter_map(|key| key.trim().parse().ok())
                .collect(),
        }
    }

    /// Inverse of [`RegionSet::parse_param`].
    pub fn to_param(self) -> String {
        self.iter()
            .map(RegionKey::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromIterator<RegionKey> for RegionSet {
    fn from_iter<I: IntoIterator<Item = RegionKey>>(iter: I) -> Self {
        let mut set = RegionSet::empty();
        for region in iter {
            set.insert(region);
        }
        set
    }
}

/// One point of the pick-rate vs win-rate scatter plot. Rates are percents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDatum {
    pub id: RawHeroId,
    pub hero: String,
    pub pick_rate: f64,
    pub win_rate: f64,
    pub ban_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<RegionKey>,
}

/// Which relation list a target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Assist,
    Strong,
    Weak,
}

impl RelationKind {
    pub const ALL: [RelationKind; 3] = [RelationKind::Assist, RelationKind::Strong, RelationKind::Weak];

    pub fn label(self) -> &'static str {
        match self {
            RelationKind::Assist => "Assist",
            RelationKind::Strong => "Strong",
            RelationKind::Weak => "Weak",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationTarget {
    pub id: HeroId,
    pub name: String,
}

/// Resolved relation targets of one hero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationTargetSet {
    pub assist: Vec<RelationTarget>,
    pub strong: Vec<RelationTarget>,
    pub weak: Vec<RelationTarget>,
}

impl RelationTargetSet {
    pub fn is_empty(&self) -> bool {
        self.assist.is_empty() && self.strong.is_empty() && self.weak.is_empty()
    }

    pub fn get(&self, kind: RelationKind) -> &[RelationTarget] {
        match kind {
            RelationKind::Assist => &self.assist,
            RelationKind::Strong => &self.strong,
            RelationKind::Weak => &self.weak,
        }
    }
}

/// A ranking record joined with its hero-list relations.
#[derive(Debug, Clone, Serialize)]
pub struct HeroRankRow {
    #[serde(flatten)]
    pub record: HeroRankRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<HeroRelationSet>,
    #[serde(rename = "relationTargets", skip_serializing_if = "Option::is_none")]
    pub relation_targets: Option<RelationTargetSet>,
}

impl HeroRankRow {
    pub fn new(record: HeroRankRecord) -> Self {
        Self {
            record,
            relation: None,
            relation_targets: None,
        }
    }
}
