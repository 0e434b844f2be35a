//! Pick-rate vs win-rate scatter plot as inline SVG.

use std::fmt::Write;

use crate::calculate::RateMeans;
use crate::models::{ChartDatum, HeroId, RegionKey};

use super::escape_html;

const TICKS: usize = 5;
const MIN_RADIUS: f64 = 4.0;
const MAX_RADIUS: f64 = 14.0;
const UNCLASSIFIED_FILL: &str = "#94a3b8";

/// Plot geometry.
#[derive(Debug, Clone, Copy)]
pub struct ChartLayout {
    pub width: f64,
    pub height: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            width: 760.0,
            height: 440.0,
            margin_left: 64.0,
            margin_right: 32.0,
            margin_top: 28.0,
            margin_bottom: 52.0,
        }
    }
}

impl ChartLayout {
    fn left(&self) -> f64 {
        self.margin_left
    }

    fn right(&self) -> f64 {
        self.width - self.margin_right
    }

    fn top(&self) -> f64 {
        self.margin_top
    }

    fn bottom(&self) -> f64 {
        self.height - self.margin_bottom
    }
}

/// Linear map from a data domain to a pixel range.
#[derive(Debug, Clone, Copy)]
struct Scale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl Scale {
    fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        let clamped = value.clamp(d0.min(d1), d0.max(d1));
        r0 + (clamped - d0) / (d1 - d0) * (r1 - r0)
    }

    fn ticks(&self) -> impl Iterator<Item = f64> + '_ {
        let (d0, d1) = self.domain;
        (0..=TICKS).map(move |i| d0 + (d1 - d0) * i as f64 / TICKS as f64)
    }
}

/// Render the scatter plot. Bubble size follows ban rate, point colour the
/// quadrant. Quadrant shading and mean lines are drawn only when both means
/// exist.
pub fn render_scatter(
    points: &[ChartDatum],
    means: &RateMeans,
    pick_domain: (f64, f64),
    win_domain: (f64, f64),
    highlight: Option<HeroId>,
    layout: &ChartLayout,
) -> String {
    let x = Scale {
        domain: pick_domain,
        range: (layout.left(), layout.right()),
    };
    let y = Scale {
        domain: win_domain,
        range: (layout.bottom(), layout.top()),
    };

    let mut svg = String::new();
    let _ = write!(
        svg,
        r##"<svg class="scatter" viewBox="0 0 {w} {h}" width="100%" role="img" aria-label="Pick rate versus win rate">"##,
        w = layout.width,
        h = layout.height
    );

    if let (Some(pick_mean), Some(win_mean)) = (means.pick, means.win) {
        if pick_mean.is_finite() && win_mean.is_finite() {
            write_quadrants(&mut svg, &x, &y, pick_mean, win_mean);
        }
    }

    write_grid(&mut svg, &x, &y, layout);

    if let Some(pick_mean) = means.pick.filter(|m| m.is_finite()) {
        let px = x.map(pick_mean);
        let _ = write!(
            svg,
            r##"<line x1="{px:.1}" y1="{top:.1}" x2="{px:.1}" y2="{bottom:.1}" stroke="#f97316" stroke-dasharray="4 4"/><text x="{px:.1}" y="{label_y:.1}" text-anchor="middle" font-size="12" fill="#fed7aa">Pick Avg</text>"##,
            top = layout.top(),
            bottom = layout.bottom(),
            label_y = layout.top() - 8.0,
        );
    }
    if let Some(win_mean) = means.win.filter(|m| m.is_finite()) {
        let py = y.map(win_mean);
        let _ = write!(
            svg,
            r##"<line x1="{left:.1}" y1="{py:.1}" x2="{right:.1}" y2="{py:.1}" stroke="#10b981" stroke-dasharray="4 4"/><text x="{label_x:.1}" y="{label_y:.1}" text-anchor="end" font-size="12" fill="#bbf7d0">Win Avg</text>"##,
            left = layout.left(),
            right = layout.right(),
            label_x = layout.right(),
            label_y = py - 6.0,
        );
    }

    if points.is_empty() {
        let _ = write!(
            svg,
            r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="14" fill="#94a3b8">No hero data for this filter.</text>"##,
            (layout.left() + layout.right()) / 2.0,
            (layout.top() + layout.bottom()) / 2.0
        );
    } else {
        write_points(&mut svg, points, &x, &y, highlight);
    }

    svg.push_str("</svg>");
    svg
}

fn write_quadrants(svg: &mut String, x: &Scale, y: &Scale, pick_mean: f64, win_mean: f64) {
    let (x0, x1) = x.range;
    let (y_bottom, y_top) = y.range;
    let mx = x.map(pick_mean);
    let my = y.map(win_mean);

    let areas = [
        (RegionKey::LowPickHighWin, x0, y_top, mx - x0, my - y_top),
        (RegionKey::HighPickHighWin, mx, y_top, x1 - mx, my - y_top),
        (RegionKey::LowPickLowWin, x0, my, mx - x0, y_bottom - my),
        (RegionKey::HighPickLowWin, mx, my, x1 - mx, y_bottom - my),
    ];
    for (region, rx, ry, width, height) in areas {
        let _ = write!(
            svg,
            r##"<rect class="quadrant" data-region="{}" x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" fill-opacity="0.12"/>"##,
            region.as_str(),
            rx,
            ry,
            width.max(0.0),
            height.max(0.0),
            region.color()
        );
    }
}

fn write_grid(svg: &mut String, x: &Scale, y: &Scale, layout: &ChartLayout) {
    for tick in x.ticks() {
        let px = x.map(tick);
        let _ = write!(
            svg,
            r##"<line x1="{px:.1}" y1="{top:.1}" x2="{px:.1}" y2="{bottom:.1}" stroke="rgba(148,163,184,0.25)" stroke-dasharray="3 3"/><text x="{px:.1}" y="{label_y:.1}" text-anchor="middle" font-size="12" fill="#c7d2fe">{tick:.1}%</text>"##,
            top = layout.top(),
            bottom = layout.bottom(),
            label_y = layout.bottom() + 18.0,
        );
    }
    for tick in y.ticks() {
        let py = y.map(tick);
        let _ = write!(
            svg,
            r##"<line x1="{left:.1}" y1="{py:.1}" x2="{right:.1}" y2="{py:.1}" stroke="rgba(148,163,184,0.25)" stroke-dasharray="3 3"/><text x="{label_x:.1}" y="{label_y:.1}" text-anchor="end" font-size="12" fill="#c7d2fe">{tick:.1}%</text>"##,
            left = layout.left(),
            right = layout.right(),
            label_x = layout.left() - 8.0,
            label_y = py + 4.0,
        );
    }

    let _ = write!(
        svg,
        r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="13" fill="#e2e8f0">Pick Rate</text><text x="16" y="{:.1}" text-anchor="middle" font-size="13" fill="#e2e8f0" transform="rotate(-90, 16, {:.1})">Win Rate</text>"##,
        (layout.left() + layout.right()) / 2.0,
        layout.height - 10.0,
        (layout.top() + layout.bottom()) / 2.0,
        (layout.top() + layout.bottom()) / 2.0,
    );
}

fn write_points(
    svg: &mut String,
    points: &[ChartDatum],
    x: &Scale,
    y: &Scale,
    highlight: Option<HeroId>,
) {
    let (ban_min, ban_max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d.ban_rate), hi.max(d.ban_rate))
        });
    let radius = |ban_rate: f64| {
        if ban_max > ban_min {
            MIN_RADIUS + (ban_rate - ban_min) / (ban_max - ban_min) * (MAX_RADIUS - MIN_RADIUS)
        } else {
            (MIN_RADIUS + MAX_RADIUS) / 2.0
        }
    };

    let mut highlighted = None;
    for datum in points {
        let is_highlight = highlight.is_some() && datum.id.to_hero_id() == highlight;
        if is_highlight {
            highlighted = Some(datum);
            continue;
        }
        write_point(svg, datum, x, y, radius(datum.ban_rate), false);
    }
    // Drawn last so it sits above its neighbours.
    if let Some(datum) = highlighted {
        write_point(svg, datum, x, y, radius(datum.ban_rate) + 3.0, true);
    }
}

fn write_point(svg: &mut String, datum: &ChartDatum, x: &Scale, y: &Scale, r: f64, highlight: bool) {
    let fill = datum.region.map_or(UNCLASSIFIED_FILL, RegionKey::color);
    let stroke = if highlight {
        r##" stroke="#ffffff" stroke-width="3""##
    } else {
        r##" stroke="rgba(15,23,42,0.6)" stroke-width="1""##
    };
    let _ = write!(
        svg,
        r##"<circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{}" fill-opacity="0.85"{}><title>{} · Pick {:.1}% · Win {:.1}% · Ban {:.1}%</title></circle>"##,
        x.map(datum.pick_rate),
        y.map(datum.win_rate),
        r,
        fill,
        stroke,
        escape_html(&datum.hero),
        datum.pick_rate,
        datum.win_rate,
        datum.ban_rate
    );
}
