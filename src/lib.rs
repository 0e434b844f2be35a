//! # MLBB Dashboard
//!
//! A server-rendered Mobile Legends: Bang Bang hero statistics dashboard.
//!
//! ## Architecture
//!
//! - **models**: Upstream records, identifiers, query enums and derived analytics types
//! - **calculate**: Name resolution, relation mapping, scatter data and quadrant regions
//! - **source**: The stats API client and an offline fixture source
//! - **fetch**: HTTP fetching with an on-disk response cache
//! - **dashboard**: Query parsing and assembly of the dashboard view model
//! - **render**: HTML and SVG rendering
//! - **api**: Axum router, handlers and error mapping
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod models;
pub mod render;
pub mod source;

pub use models::*;

use std::time::Duration;

/// Parse a cache window such as "15m", "6h", "90s" or a bare number of
/// seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);

    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return None,
    };

    let value: u64 = digits.parse().ok()?;
    value.checked_mul(multiplier).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("15m"), Some(Duration::from_secs(900)));
        assert_eq!(parse_duration("6h"), Some(Duration::from_secs(21600)));
        assert_eq!(parse_duration("90s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("1d"), Some(Duration::from_secs(86400)));
        assert_eq!(parse_duration("0s"), Some(Duration::ZERO));
    }

    #[test]
    fn test_parse_duration_bare_seconds() {
        assert_eq!(parse_duration("120"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration(" 30 m "), Some(Duration::from_secs(1800)));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("m"), None);
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(parse_duration("-5m"), None);
        assert_eq!(parse_duration("10w"), None);
        assert_eq!(parse_duration("99999999999999999999h"), None);
    }
}
