//! The dashboard page.

use std::fmt::Write;

use crate::calculate::{format_percent, meta_score};
use crate::dashboard::{Dashboard, SortColumn, TableSort};
use crate::models::{
    HeroRankRow, RankDays, RankTier, RegionKey, RegionSet, RelationKind, RelationTargetSet,
    SortOrder,
};

use super::{escape_html, initials, layout, render_scatter, ChartLayout};

/// Inline relation badges shown per group before collapsing into "+N".
const MAX_BADGES: usize = 3;

/// Page-level facts that do not come from the data itself.
#[derive(Debug, Clone)]
pub struct PageMeta {
    /// Upstream API link shown in the header
    pub source_url: String,
    /// Human form of the cache TTL
    pub cache_window: String,
}

pub fn render_dashboard(dashboard: &Dashboard, meta: &PageMeta) -> String {
    let mut body = String::new();
    write_header(&mut body, dashboard, meta);
    write_filters(&mut body, dashboard);
    write_regions(&mut body, dashboard);

    let _ = write!(
        body,
        r#"<section class="card"><h2>Pick vs Win Rate</h2><p class="more">Bubble size represents ban rate.</p>{}</section>"#,
        render_scatter(
            &dashboard.chart,
            &dashboard.means,
            dashboard.pick_domain,
            dashboard.win_domain,
            dashboard.query.highlight,
            &ChartLayout::default(),
        )
    );

    write_table(&mut body, dashboard);
    layout("MLBB Hero Meta", &body)
}

fn write_header(out: &mut String, dashboard: &Dashboard, meta: &PageMeta) {
    let synced = dashboard
        .fetched_at
        .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let _ = write!(
        out,
        r#"<header><div><h1>MLBB Hero Meta</h1><p>{} · {} · {} of {} heroes shown</p></div><div><p>Source: <a href="{src}">{src}</a></p><p>Last sync: {} · Cache window: {}</p></div></header>"#,
        dashboard.query.days.label(),
        dashboard.query.rank.label(),
        dashboard.rows.len(),
        dashboard.total,
        escape_html(&synced),
        escape_html(&meta.cache_window),
        src = escape_html(&meta.source_url),
    );
}

fn write_filters(out: &mut String, dashboard: &Dashboard) {
    let query = &dashboard.query;

    let days: String = RankDays::all()
        .map(|days| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                days,
                selected(days == query.days),
                days.label()
            )
        })
        .collect();
    let ranks: String = RankTier::ALL
        .into_iter()
        .map(|rank| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                rank.as_str(),
                selected(rank == query.rank),
                rank.label()
            )
        })
        .collect();

    let mut hidden = format!(
        r#"<input type="hidden" name="sort" value="{}"><input type="hidden" name="order" value="{}">"#,
        query.sort.column.as_str(),
        query.sort.order.as_str()
    );
    if !query.regions.is_all() {
        let _ = write!(
            hidden,
            r#"<input type="hidden" name="regions" value="{}">"#,
            query.regions.to_param()
        );
    }

    let _ = write!(
        out,
        r#"<section class="card"><form class="filters" method="get" action="/"><label>Period<select name="days">{}</select></label><label>Rank<select name="rank">{}</select></label><label>Search<input type="search" name="q" value="{}" placeholder="Hero name"></label>{}<button type="submit">Apply</button></form></section>"#,
        days,
        ranks,
        escape_html(query.search.as_deref().unwrap_or("")),
        hidden
    );
}

fn selected(is_selected: bool) -> &'static str {
    if is_selected {
        " selected"
    } else {
        ""
    }
}

fn write_regions(out: &mut String, dashboard: &Dashboard) {
    let query = &dashboard.query;
    out.push_str(r#"<section class="card regions"><strong>Regions</strong>"#);

    for region in RegionKey::ALL {
        let active = query.regions.contains(region);
        let href = format!("/?{}", query.to_query_string(query.regions.toggled(region), query.sort));
        let style = if active {
            format!(r#" style="background:{}""#, region.color())
        } else {
            String::new()
        };
        let _ = write!(
            out,
            r#"<a class="region{}" href="{}"{}><span class="swatch" style="background:{}"></span>{}</a>"#,
            if active { " active" } else { "" },
            escape_html(&href),
            style,
            region.color(),
            region.label()
        );
    }

    let all = format!("/?{}", query.to_query_string(RegionSet::all(), query.sort));
    let none = format!("/?{}", query.to_query_string(RegionSet::empty(), query.sort));
    let _ = write!(
        out,
        r#"<a href="{}">All</a><a href="{}">Clear</a></section>"#,
        escape_html(&all),
        escape_html(&none)
    );
}

fn write_table(out: &mut String, dashboard: &Dashboard) {
    out.push_str(r#"<section class="card"><h2>Hero Rankings</h2>"#);

    if dashboard.rows.is_empty() {
        out.push_str(r#"<p class="empty">No hero data for this filter.</p></section>"#);
        return;
    }

    out.push_str("<table><thead><tr><th>Hero</th>");
    for column in [
        SortColumn::WinRate,
        SortColumn::PickRate,
        SortColumn::BanRate,
        SortColumn::MetaScore,
    ] {
        write_sort_header(out, dashboard, column);
    }
    out.push_str("<th>Relations</th></tr></thead><tbody>");

    for row in &dashboard.rows {
        write_row(out, dashboard, row);
    }
    out.push_str("</tbody></table></section>");
}

fn write_sort_header(out: &mut String, dashboard: &Dashboard, column: SortColumn) {
    let current = dashboard.query.sort;
    let (next, arrow) = if current.column == column {
        let arrow = match current.order {
            SortOrder::Asc => " ▲",
            SortOrder::Desc => " ▼",
        };
        (
            TableSort {
                column,
                order: current.order.reversed(),
            },
            arrow,
        )
    } else {
        (
            TableSort {
                column,
                order: SortOrder::Desc,
            },
            "",
        )
    };

    let href = format!(
        "/?{}",
        dashboard.query.to_query_string(dashboard.query.regions, next)
    );
    let _ = write!(
        out,
        r#"<th><a href="{}">{}{}</a></th>"#,
        escape_html(&href),
        column.label(),
        arrow
    );
}

fn write_row(out: &mut String, dashboard: &Dashboard, row: &HeroRankRow) {
    let record = &row.record;
    let name = record.display_name();
    let id = record.main_heroid.to_hero_id();
    let is_highlight = id.is_some() && id == dashboard.query.highlight;

    let portrait = match id.and_then(|id| dashboard.portrait(&id)) {
        Some(src) => {
            let proxied = format!(
                "/api/image-proxy?{}",
                url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("src", src)
                    .finish()
            );
            format!(
                r#"<img src="{}" alt="{}" loading="lazy">"#,
                escape_html(&proxied),
                escape_html(&name)
            )
        }
        None => format!(r#"<span class="avatar">{}</span>"#, escape_html(&initials(&name))),
    };

    let hero_cell = match id {
        Some(id) => {
            let mut query = dashboard.query.clone();
            query.highlight = if is_highlight { None } else { Some(id) };
            format!(
                r#"<a href="/?{}">{}</a>"#,
                escape_html(&query.current_query_string()),
                escape_html(&name)
            )
        }
        None => escape_html(&name),
    };

    let region_style = dashboard
        .region_of(row)
        .map(|region| format!(r#" style="border-left:3px solid {}""#, region.color()))
        .unwrap_or_default();

    let _ = write!(
        out,
        r#"<tr{}{}><td><div class="hero">{}<div>{}<small>ID {}</small></div></div></td><td>{}</td><td>{}</td><td>{}</td><td>{:.1}</td><td>{}</td></tr>"#,
        if is_highlight { r#" class="highlight""# } else { "" },
        region_style,
        portrait,
        hero_cell,
        escape_html(&record.main_heroid.to_string()),
        format_percent(record.main_hero_win_rate),
        format_percent(record.main_hero_appearance_rate),
        format_percent(record.main_hero_ban_rate),
        meta_score(record),
        render_relations(row.relation_targets.as_ref())
    );
}

/// Relation badge groups, each capped at [`MAX_BADGES`] with a "+N" suffix.
pub(crate) fn render_relations(targets: Option<&RelationTargetSet>) -> String {
    let Some(targets) = targets else {
        return r#"<span class="more">--</span>"#.to_string();
    };

    let mut out = String::from(r#"<div class="relations">"#);
    for kind in RelationKind::ALL {
        let group = targets.get(kind);
        if group.is_empty() {
            continue;
        }
        let _ = write!(out, r#"<div><span class="relation-label">{}</span>"#, kind.label());
        for target in group.iter().take(MAX_BADGES) {
            let _ = write!(out, r#"<span class="badge">{}</span>"#, escape_html(&target.name));
        }
        if group.len() > MAX_BADGES {
            let _ = write!(out, r#"<span class="more">+{}</span>"#, group.len() - MAX_BADGES);
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");
    out
}
