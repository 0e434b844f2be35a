//! Dashboard view model.
//!
//! Runs the analytics transform over one hero list and one ranking page and
//! applies the table controls (region filter, search, sort). Rendering and
//! the JSON API both read from [`Dashboard`].

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculate::{
    assign_regions, attach_relations, build_chart_data, classify, expand_domain,
    filter_by_regions, meta_score, resolve_hero_names, NameMap, RateMeans,
};
use crate::models::{
    ChartDatum, HeroId, HeroListRecord, HeroRankQuery, HeroRankRecord, HeroRankRow, RankDays,
    RankTier, RegionKey, RegionSet, SortOrder,
};
use crate::source::{SourceError, StatsSource};

/// Padding added around chart axis ranges, in percentage points.
const DOMAIN_PADDING: f64 = 1.0;

/// Table column the rows are sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    #[default]
    WinRate,
    PickRate,
    BanRate,
    MetaScore,
}

impl SortColumn {
    pub const ALL: [SortColumn; 4] = [
        SortColumn::WinRate,
        SortColumn::PickRate,
        SortColumn::BanRate,
        SortColumn::MetaScore,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortColumn::WinRate => "win_rate",
            SortColumn::PickRate => "pick_rate",
            SortColumn::BanRate => "ban_rate",
            SortColumn::MetaScore => "meta_score",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortColumn::WinRate => "Win Rate",
            SortColumn::PickRate => "Pick Rate",
            SortColumn::BanRate => "Ban Rate",
            SortColumn::MetaScore => "Meta Score",
        }
    }

    /// Sort value of a row; missing or malformed rates sort as zero.
    fn value(self, record: &HeroRankRecord) -> f64 {
        let rate = |value: Option<f64>| value.filter(|v| v.is_finite()).unwrap_or(0.0);
        match self {
            SortColumn::WinRate => rate(record.main_hero_win_rate),
            SortColumn::PickRate => rate(record.main_hero_appearance_rate),
            SortColumn::BanRate => rate(record.main_hero_ban_rate),
            SortColumn::MetaScore => meta_score(record),
        }
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|column| column.as_str() == s)
            .ok_or_else(|| format!("unknown sort column: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableSort {
    pub column: SortColumn,
    pub order: SortOrder,
}

impl Default for TableSort {
    fn default() -> Self {
        Self {
            column: SortColumn::WinRate,
            order: SortOrder::Desc,
        }
    }
}

impl TableSort {
    /// Parse the `sort` and `order` parameters, falling back to the
    /// defaults for anything unrecognised.
    pub fn parse(column: Option<&str>, order: Option<&str>) -> Self {
        let default = Self::default();
        Self {
            column: column.and_then(|c| c.parse().ok()).unwrap_or(default.column),
            order: order.and_then(|o| o.parse().ok()).unwrap_or(default.order),
        }
    }

    pub fn apply(self, rows: &mut [HeroRankRow]) {
        rows.sort_by(|a, b| {
            let ordering = self
                .column
                .value(&a.record)
                .total_cmp(&self.column.value(&b.record));
            match self.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }
}

/// Raw dashboard query parameters, as they arrive on the URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardParams {
    pub days: Option<String>,
    pub rank: Option<String>,
    pub regions: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub highlight: Option<String>,
}

/// Validated dashboard controls.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardQuery {
    pub days: RankDays,
    pub rank: RankTier,
    pub regions: RegionSet,
    pub search: Option<String>,
    pub sort: TableSort,
    pub highlight: Option<HeroId>,
}

impl Default for DashboardQuery {
    fn default() -> Self {
        Self {
            days: RankDays::default(),
            rank: RankTier::default(),
            regions: RegionSet::all(),
            search: None,
            sort: TableSort::default(),
            highlight: None,
        }
    }
}

impl From<&DashboardParams> for DashboardQuery {
    fn from(params: &DashboardParams) -> Self {
        Self {
            days: RankDays::parse_or_default(params.days.as_deref()),
            rank: RankTier::parse_or_default(params.rank.as_deref()),
            regions: RegionSet::parse_param(params.regions.as_deref()),
            search: params
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            sort: TableSort::parse(params.sort.as_deref(), params.order.as_deref()),
            highlight: params
                .highlight
                .as_deref()
                .and_then(|id| id.trim().parse().ok())
                .and_then(HeroId::new),
        }
    }
}

impl DashboardQuery {
    /// Upstream ranking request for these controls.
    pub fn rank_query(&self, page_size: u32) -> HeroRankQuery {
        HeroRankQuery::new(self.days, self.rank, page_size)
    }

    /// URL query string reproducing these controls, with overrides applied.
    pub fn to_query_string(&self, regions: RegionSet, sort: TableSort) -> String {
        let mut pairs = url::form_urlencoded::Serializer::new(String::new());
        pairs.append_pair("days", &self.days.to_string());
        pairs.append_pair("rank", self.rank.as_str());
        if !regions.is_all() {
            pairs.append_pair("regions", &regions.to_param());
        }
        if let Some(q) = &self.search {
            pairs.append_pair("q", q);
        }
        pairs.append_pair("sort", sort.column.as_str());
        pairs.append_pair("order", sort.order.as_str());
        if let Some(id) = self.highlight {
            pairs.append_pair("highlight", &id.to_string());
        }
        pairs.finish()
    }

    pub fn current_query_string(&self) -> String {
        self.to_query_string(self.regions, self.sort)
    }
}

/// Case-insensitive match on the hero name, falling back to the raw id
/// when the record carries no name.
pub fn matches_search(record: &HeroRankRecord, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    let haystack = match record.main_hero_name() {
        Some(name) => name.to_lowercase(),
        None => record.main_heroid.to_string().to_lowercase(),
    };
    haystack.contains(&needle)
}

/// Everything one dashboard render needs.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    #[serde(skip)]
    pub query: DashboardQuery,
    #[serde(skip)]
    pub names: NameMap,
    /// Table rows after region filter, search and sort
    pub rows: Vec<HeroRankRow>,
    /// Ranking records received before any filtering
    pub total: usize,
    /// Upstream-reported total
    pub upstream_total: u64,
    /// Chart points passing the region filter, tagged with their quadrant
    pub chart: Vec<ChartDatum>,
    pub means: RateMeans,
    pub pick_domain: (f64, f64),
    pub win_domain: (f64, f64),
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub portraits: HashMap<HeroId, String>,
}

impl Dashboard {
    /// Run the transform and apply the table controls.
    pub fn build(
        query: DashboardQuery,
        heroes: &[HeroListRecord],
        rankings: Vec<HeroRankRecord>,
    ) -> Self {
        let total = rankings.len();
        let names = resolve_hero_names(&rankings, heroes);
        let portraits = collect_portraits(heroes, &rankings);

        // Means and domains come from the full request dataset so toggling a
        // region never moves the reference lines.
        let all_points = build_chart_data(&rankings);
        let means = RateMeans::of(&all_points);
        let pick_domain = expand_domain(all_points.iter().map(|d| d.pick_rate), DOMAIN_PADDING);
        let win_domain = expand_domain(all_points.iter().map(|d| d.win_rate), DOMAIN_PADDING);

        let chart = assign_regions(
            filter_by_regions(&all_points, query.regions).into_owned(),
            &means,
        );

        let rows = attach_relations(rankings, heroes, &names);
        let mut rows = filter_by_regions(&rows, query.regions).into_owned();
        if let Some(needle) = &query.search {
            rows.retain(|row| matches_search(&row.record, needle));
        }
        query.sort.apply(&mut rows);

        debug!(
            "Dashboard built: {} of {} rows, {} chart points",
            rows.len(),
            total,
            chart.len()
        );

        Self {
            query,
            names,
            rows,
            total,
            upstream_total: total as u64,
            chart,
            means,
            pick_domain,
            win_domain,
            fetched_at: None,
            portraits,
        }
    }

    /// Fetch both payloads concurrently and build the dashboard.
    pub async fn load(
        source: &dyn StatsSource,
        query: DashboardQuery,
        page_size: u32,
    ) -> Result<Self, SourceError> {
        let rank_query = query.rank_query(page_size);
        let (heroes, rankings) =
            tokio::try_join!(source.hero_list(), source.hero_rankings(&rank_query))?;

        let fetched_at = match (heroes.fetched_at, rankings.fetched_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let upstream_total = rankings.total;

        let mut dashboard = Self::build(query, &heroes.records, rankings.records);
        dashboard.fetched_at = fetched_at;
        dashboard.upstream_total = upstream_total;
        Ok(dashboard)
    }

    /// Quadrant of a table row against the full dataset means.
    pub fn region_of(&self, row: &HeroRankRow) -> Option<RegionKey> {
        classify(row, &self.means)
    }

    pub fn portrait(&self, id: &HeroId) -> Option<&str> {
        self.portraits.get(id).map(String::as_str)
    }

    /// Chart points grouped by quadrant, in chart order.
    pub fn chart_by_region(&self) -> Vec<(RegionKey, Vec<&ChartDatum>)> {
        RegionKey::ALL
            .into_iter()
            .map(|region| {
                let points = self
                    .chart
                    .iter()
                    .filter(|datum| datum.region == Some(region))
                    .collect();
                (region, points)
            })
            .collect()
    }
}

/// Portrait URL per hero: hero list first, ranking avatars fill the gaps.
fn collect_portraits(
    heroes: &[HeroListRecord],
    rankings: &[HeroRankRecord],
) -> HashMap<HeroId, String> {
    let mut portraits = HashMap::new();
    let list = heroes
        .iter()
        .map(|hero| (hero.hero_id.to_hero_id(), hero.hero.as_ref()));
    let ranked = rankings
        .iter()
        .map(|record| (record.main_heroid.to_hero_id(), record.main_hero.as_ref()));

    for (id, avatar) in list.chain(ranked) {
        let (Some(id), Some(url)) = (id, avatar.and_then(|a| a.portrait_url())) else {
            continue;
        };
        portraits.entry(id).or_insert_with(|| url.to_string());
    }
    portraits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn heroes() -> Vec<HeroListRecord> {
        serde_json::from_value(json!([
            {
                "hero_id": 1,
                "hero": {"data": {"name": "Layla", "head": "https://akmweb.youngjoygame.com/layla.png"}},
                "relation": {"strong": {"target_hero_id": [2, 2, 3]}}
            },
            {"hero_id": 2, "hero": {"data": {"name": "Tigreal"}}},
            {"hero_id": 3, "hero": {"data": {"name": "Eudora"}}},
            {"hero_id": 4, "hero": {"data": {"name": "Saber"}}}
        ]))
        .unwrap()
    }

    fn rankings() -> Vec<HeroRankRecord> {
        serde_json::from_value(json!([
            {"main_heroid": 1, "main_hero": {"data": {"name": "Layla"}},
             "main_hero_appearance_rate": 0.8, "main_hero_win_rate": 0.6, "main_hero_ban_rate": 0.1},
            {"main_heroid": 2, "main_hero": {"data": {"name": "Tigreal"}},
             "main_hero_appearance_rate": 0.2, "main_hero_win_rate": 0.4, "main_hero_ban_rate": 0.0},
            {"main_heroid": 3, "main_hero": {"data": {"name": "Eudora"}},
             "main_hero_appearance_rate": 0.4, "main_hero_win_rate": 0.55, "main_hero_ban_rate": 0.3},
            {"main_heroid": 4, "main_hero": {"data": {"name": "Saber"}},
             "main_hero_appearance_rate": 0.6, "main_hero_win_rate": 0.45, "main_hero_ban_rate": 0.0}
        ]))
        .unwrap()
    }

    fn row_ids(dashboard: &Dashboard) -> Vec<String> {
        dashboard
            .rows
            .iter()
            .map(|row| row.record.main_heroid.to_string())
            .collect()
    }

    fn query(params: DashboardParams) -> DashboardQuery {
        DashboardQuery::from(&params)
    }

    fn approx(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-9
    }

    fn approx_domain(actual: (f64, f64), expected: (f64, f64)) -> bool {
        approx(actual.0, expected.0) && approx(actual.1, expected.1)
    }

    #[test]
    fn test_query_defaults() {
        let q = query(DashboardParams::default());
        assert_eq!(q, DashboardQuery::default());
        assert!(q.regions.is_all());
    }

    #[test]
    fn test_query_parsing() {
        let q = query(DashboardParams {
            days: Some("7".to_string()),
            rank: Some("mythic".to_string()),
            regions: Some("".to_string()),
            q: Some("  ".to_string()),
            sort: Some("meta_score".to_string()),
            order: Some("asc".to_string()),
            highlight: Some("0".to_string()),
        });

        assert_eq!(q.days.get(), 7);
        assert_eq!(q.rank, RankTier::Mythic);
        assert!(q.regions.is_empty());
        assert_eq!(q.search, None);
        assert_eq!(q.sort.column, SortColumn::MetaScore);
        assert_eq!(q.sort.order, SortOrder::Asc);
        assert_eq!(q.highlight, None);
    }

    #[test]
    fn test_invalid_params_fall_back() {
        let q = query(DashboardParams {
            days: Some("4".to_string()),
            rank: Some("bronze".to_string()),
            sort: Some("name".to_string()),
            order: Some("up".to_string()),
            ..Default::default()
        });
        assert_eq!(q, DashboardQuery::default());
    }

    #[test]
    fn test_query_string() {
        let q = query(DashboardParams {
            days: Some("3".to_string()),
            q: Some("lay la".to_string()),
            ..Default::default()
        });
        assert_eq!(
            q.current_query_string(),
            "days=3&rank=all&q=lay+la&sort=win_rate&order=desc"
        );

        let lone: RegionSet = [RegionKey::LowPickLowWin].into_iter().collect();
        assert!(q
            .to_query_string(lone, q.sort)
            .contains("regions=lowPickLowWin"));
        assert!(q
            .to_query_string(RegionSet::empty(), q.sort)
            .contains("regions=&"));
    }

    #[test]
    fn test_build_full_dataset() {
        let dashboard = Dashboard::build(DashboardQuery::default(), &heroes(), rankings());

        assert_eq!(dashboard.total, 4);
        assert_eq!(row_ids(&dashboard), vec!["1", "3", "4", "2"]);
        assert_eq!(dashboard.chart.len(), 4);
        assert!(dashboard.chart.iter().all(|d| d.region.is_some()));
        assert!(approx(dashboard.means.pick.unwrap(), 50.0));
        assert!(approx(dashboard.means.win.unwrap(), 50.0));
        assert!(approx_domain(dashboard.pick_domain, (19.0, 81.0)));
        assert!(approx_domain(dashboard.win_domain, (39.0, 61.0)));

        let layla = &dashboard.rows[0];
        let strong = &layla.relation_targets.as_ref().unwrap().strong;
        let names: Vec<&str> = strong.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Tigreal", "Eudora"]);
        assert_eq!(
            dashboard.portrait(&HeroId::new(1).unwrap()),
            Some("https://akmweb.youngjoygame.com/layla.png")
        );
    }

    #[test]
    fn test_region_filter_keeps_full_means() {
        let q = DashboardQuery {
            regions: [RegionKey::LowPickHighWin].into_iter().collect(),
            ..Default::default()
        };
        let dashboard = Dashboard::build(q, &heroes(), rankings());

        assert_eq!(row_ids(&dashboard), vec!["3"]);
        assert_eq!(dashboard.chart.len(), 1);
        assert_eq!(dashboard.chart[0].region, Some(RegionKey::LowPickHighWin));
        assert!(approx(dashboard.means.pick.unwrap(), 50.0));
        assert!(approx_domain(dashboard.pick_domain, (19.0, 81.0)));
        assert_eq!(
            dashboard.region_of(&dashboard.rows[0]),
            Some(RegionKey::LowPickHighWin)
        );
    }

    #[test]
    fn test_no_regions_selected() {
        let q = DashboardQuery {
            regions: RegionSet::empty(),
            ..Default::default()
        };
        let dashboard = Dashboard::build(q, &heroes(), rankings());

        assert!(dashboard.rows.is_empty());
        assert!(dashboard.chart.is_empty());
        assert_eq!(dashboard.total, 4);
    }

    #[test]
    fn test_search_and_sort() {
        let q = query(DashboardParams {
            q: Some("E".to_string()),
            sort: Some("pick_rate".to_string()),
            order: Some("asc".to_string()),
            ..Default::default()
        });
        let dashboard = Dashboard::build(q, &heroes(), rankings());

        // Tigreal, Eudora, Saber contain "e"; Layla does not.
        assert_eq!(row_ids(&dashboard), vec!["2", "3", "4"]);
    }

    #[test]
    fn test_search_falls_back_to_id() {
        let rankings: Vec<HeroRankRecord> =
            serde_json::from_value(json!([{"main_heroid": 42}, {"main_heroid": 7}])).unwrap();
        let q = DashboardQuery {
            search: Some("42".to_string()),
            ..Default::default()
        };
        let dashboard = Dashboard::build(q, &[], rankings);
        assert_eq!(row_ids(&dashboard), vec!["42"]);
    }

    #[test]
    fn test_sort_by_meta_score() {
        let mut rows: Vec<HeroRankRow> = rankings().into_iter().map(HeroRankRow::new).collect();
        TableSort {
            column: SortColumn::MetaScore,
            order: SortOrder::Desc,
        }
        .apply(&mut rows);

        let ids: Vec<String> = rows.iter().map(|r| r.record.main_heroid.to_string()).collect();
        // Layla 52.5, Eudora 45.0, Saber 37.5, Tigreal 25.0
        assert_eq!(ids, vec!["1", "3", "4", "2"]);
    }

    #[test]
    fn test_empty_dataset() {
        let dashboard = Dashboard::build(DashboardQuery::default(), &[], vec![]);
        assert!(dashboard.rows.is_empty());
        assert_eq!(dashboard.means, RateMeans::default());
        assert_eq!(dashboard.pick_domain, (0.0, 100.0));
        assert_eq!(dashboard.win_domain, (0.0, 100.0));
    }

    #[tokio::test]
    async fn test_load_from_source() {
        let source = StaticSource::new(heroes(), rankings());
        let dashboard = Dashboard::load(&source, DashboardQuery::default(), 2)
            .await
            .unwrap();

        // Page size 2 keeps the two best win rates.
        assert_eq!(row_ids(&dashboard), vec!["1", "3"]);
        assert_eq!(dashboard.upstream_total, 4);
        assert_eq!(dashboard.names.get(HeroId::new(4).unwrap()), Some("Saber"));
    }
}
