//! Analytics transform.
//!
//! Turns flat upstream record lists into the derived views the dashboard
//! renders:
//! - hero id to display name resolution
//! - per-hero relation targets (assist / strong / weak)
//! - the pick-rate vs win-rate scatter dataset and its quadrants
//!
//! Everything here is pure and infallible. Malformed input is skipped or
//! replaced with a placeholder, never reported.

pub mod names;
pub mod regions;
pub mod relations;
pub mod scatter;

pub use names::{resolve_hero_names, NameMap, NameSource};
pub use regions::{assign_regions, classify, classify_rates, filter_by_regions, RateMeans, RatePoint};
pub use relations::{attach_relations, build_relation_target_set, map_relation_targets};
pub use scatter::build_chart_data;

use crate::models::HeroRankRecord;

/// Arithmetic mean, `None` for an empty slice.
///
/// Accumulated as a running mean so large finite inputs cannot overflow
/// the intermediate sum.
pub fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mean = values
        .iter()
        .enumerate()
        .fold(0.0, |mean, (i, v)| mean + (v - mean) / (i + 1) as f64);
    Some(mean)
}

/// Weighted blend of win, pick and ban rate, on a percent scale.
/// Missing or non-finite rates count as zero.
pub fn meta_score(record: &HeroRankRecord) -> f64 {
    let rate = |value: Option<f64>| value.filter(|v| v.is_finite()).unwrap_or(0.0);
    let win = rate(record.main_hero_win_rate);
    let pick = rate(record.main_hero_appearance_rate);
    let ban = rate(record.main_hero_ban_rate);
    (win * 0.5 + pick * 0.25 + ban * 0.25) * 100.0
}

/// Axis range covering `values` with `padding` on each side, floored at 0.
/// Falls back to `[0, 100]` when there is nothing to plot.
pub fn expand_domain<I>(values: I, padding: f64) -> (f64, f64)
where
    I: IntoIterator<Item = f64>,
{
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if min > max {
        return (0.0, 100.0);
    }
    ((min - padding).max(0.0), max + padding)
}

/// Format a fraction as a percent with one decimal, `--` when missing.
pub fn format_percent(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{:.1}%", v * 100.0),
        None => "--".to_string(),
    }
}
