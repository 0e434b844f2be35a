//! Hero identifiers.
//!
//! The upstream API is loose about identifier types: ids arrive as JSON
//! numbers most of the time, occasionally as numeric strings, and sometimes
//! not at all. [`RawHeroId`] keeps whatever was sent; [`HeroId`] is the
//! validated key used everywhere names and relations are resolved.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A validated, strictly positive hero identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeroId(u64);

impl HeroId {
    /// Create a HeroId, rejecting zero.
    pub fn new(id: u64) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }

    /// Coerce a floating point value. Non-finite, non-positive and
    /// fractional values are not identifiers.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value <= 0.0 || value.fract() != 0.0 || value > u64::MAX as f64 {
            return None;
        }
        Self::new(value as u64)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Display name used when no record supplies one.
    pub fn placeholder_name(self) -> String {
        format!("Hero {}", self.0)
    }
}

impl fmt::Display for HeroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An identifier exactly as the upstream sent it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawHeroId(Value);

impl RawHeroId {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Coerce to a [`HeroId`]: numbers and numeric strings are accepted,
    /// everything else is discarded.
    pub fn to_hero_id(&self) -> Option<HeroId> {
        match &self.0 {
            Value::Number(n) => n
                .as_u64()
                .and_then(HeroId::new)
                .or_else(|| n.as_f64().and_then(HeroId::from_f64)),
            Value::String(s) => s.trim().parse::<f64>().ok().and_then(HeroId::from_f64),
            _ => None,
        }
    }

    /// Placeholder label built from the raw value, used when a record
    /// carries no embedded name.
    pub fn placeholder_name(&self) -> String {
        format!("Hero {}", self)
    }
}

impl From<u64> for RawHeroId {
    fn from(id: u64) -> Self {
        Self(Value::from(id))
    }
}

impl From<HeroId> for RawHeroId {
    fn from(id: HeroId) -> Self {
        Self(Value::from(id.get()))
    }
}

impl fmt::Display for RawHeroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            Value::Null => f.write_str("unknown"),
            other => write!(f, "{}", other),
        }
    }
}
