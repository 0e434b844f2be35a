//! Scatter dataset builder.

use crate::models::{ChartDatum, HeroRankRecord};

impl ChartDatum {
    /// Project a ranking record into percent-scale chart coordinates.
    /// Missing rates count as zero; `None` if any rate is not finite.
    pub fn from_record(record: &HeroRankRecord) -> Option<Self> {
        let pick_rate = record.main_hero_appearance_rate.unwrap_or(0.0) * 100.0;
        let win_rate = record.main_hero_win_rate.unwrap_or(0.0) * 100.0;
        let ban_rate = record.main_hero_ban_rate.unwrap_or(0.0) * 100.0;

        if !(pick_rate.is_finite() && win_rate.is_finite() && ban_rate.is_finite()) {
            return None;
        }

        Some(Self {
            id: record.main_heroid.clone(),
            hero: record.display_name(),
            pick_rate,
            win_rate,
            ban_rate,
            region: None,
        })
    }
}

/// Build chart points for every record with finite rates, in input order.
pub fn build_chart_data(records: &[HeroRankRecord]) -> Vec<ChartDatum> {
    records.iter().filter_map(ChartDatum::from_record).collect()
}
