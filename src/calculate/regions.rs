//! Quadrant classification and region filtering.
//!
//! Quadrants are relative: a hero is "high pick" when its pick rate is at or
//! above the mean pick rate of the dataset it is classified against. The
//! same hero can land in different quadrants against different datasets.

use std::borrow::Cow;

use serde::Serialize;

use crate::models::{ChartDatum, HeroRankRow, RegionKey, RegionSet};

use super::average;

/// Anything that can be placed on the pick-rate / win-rate plane.
pub trait RatePoint {
    /// `(pick_rate, win_rate)` in percent, or `None` when unplottable.
    fn rates(&self) -> Option<(f64, f64)>;
}

impl RatePoint for ChartDatum {
    fn rates(&self) -> Option<(f64, f64)> {
        Some((self.pick_rate, self.win_rate))
    }
}

impl RatePoint for HeroRankRow {
    fn rates(&self) -> Option<(f64, f64)> {
        ChartDatum::from_record(&self.record).map(|datum| (datum.pick_rate, datum.win_rate))
    }
}

/// Mean pick and win rate of a dataset. Both are `None` for an empty one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RateMeans {
    pub pick: Option<f64>,
    pub win: Option<f64>,
}

impl RateMeans {
    pub fn of<T: RatePoint>(data: &[T]) -> Self {
        let rates: Vec<(f64, f64)> = data.iter().filter_map(RatePoint::rates).collect();
        let picks: Vec<f64> = rates.iter().map(|(pick, _)| *pick).collect();
        let wins: Vec<f64> = rates.iter().map(|(_, win)| *win).collect();
        Self {
            pick: average(&picks),
            win: average(&wins),
        }
    }

    pub fn is_defined(&self) -> bool {
        self.pick.is_some_and(f64::is_finite) && self.win.is_some_and(f64::is_finite)
    }
}

/// Classify a point against the given means. Exact ties go to "high" on
/// each axis independently.
pub fn classify_rates(pick_rate: f64, win_rate: f64, means: &RateMeans) -> Option<RegionKey> {
    let pick_mean = means.pick.filter(|mean| mean.is_finite())?;
    let win_mean = means.win.filter(|mean| mean.is_finite())?;
    Some(RegionKey::from_axes(
        pick_rate >= pick_mean,
        win_rate >= win_mean,
    ))
}

pub fn classify<T: RatePoint>(datum: &T, means: &RateMeans) -> Option<RegionKey> {
    let (pick_rate, win_rate) = datum.rates()?;
    classify_rates(pick_rate, win_rate, means)
}

/// Tag each chart point with its quadrant.
pub fn assign_regions(data: Vec<ChartDatum>, means: &RateMeans) -> Vec<ChartDatum> {
    data.into_iter()
        .map(|mut datum| {
            datum.region = classify(&datum, means);
            datum
        })
        .collect()
}

/// Keep only the points whose quadrant is selected.
///
/// Means are taken over the whole of `data`, so toggling one region never
/// moves the others. An empty selection keeps nothing; a full selection
/// returns `data` as-is without classifying. Unclassifiable points always
/// pass through.
pub fn filter_by_regions<'a, T>(data: &'a [T], selected: RegionSet) -> Cow<'a, [T]>
where
    T: RatePoint + Clone,
{
    if selected.is_empty() {
        return Cow::Owned(Vec::new());
    }
    if selected.is_all() {
        return Cow::Borrowed(data);
    }

    let means = RateMeans::of(data);
    Cow::Owned(
        data.iter()
            .filter(|datum| classify(*datum, &means).map_or(true, |region| selected.contains(region)))
            .cloned()
            .collect(),
    )
}
