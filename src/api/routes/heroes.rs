use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::RateMeans;
use crate::dashboard::{Dashboard, DashboardParams, DashboardQuery, TableSort};
use crate::models::{ChartDatum, HeroRankRow, RankTier, RegionKey};

#[derive(Debug, Serialize)]
pub struct HeroesResponse {
    pub rows: Vec<HeroRankRow>,
    /// Rows left after region filter and search
    pub count: usize,
    /// Ranking records before filtering
    pub total: usize,
    pub upstream_total: u64,
    pub days: u8,
    pub rank: RankTier,
    pub regions: Vec<RegionKey>,
    pub sort: TableSort,
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct AxisDomains {
    pub pick: (f64, f64),
    pub win: (f64, f64),
}

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub points: Vec<ChartDatum>,
    pub means: RateMeans,
    pub domains: AxisDomains,
    pub fetched_at: Option<DateTime<Utc>>,
}

async fn load(state: &AppState, params: &DashboardParams) -> Result<Dashboard, ApiError> {
    let dashboard = Dashboard::load(
        state.source.as_ref(),
        DashboardQuery::from(params),
        state.config.upstream.ranking_page_size,
    )
    .await
    .map_err(|e| {
        tracing::warn!("Hero data request failed: {}", e);
        ApiError::from(e)
    })?;
    Ok(dashboard)
}

/// `GET /api/heroes`: filtered and sorted ranking rows with relations.
pub async fn list_heroes(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<HeroesResponse>, ApiError> {
    let dashboard = load(&state, &params).await?;

    Ok(Json(HeroesResponse {
        count: dashboard.rows.len(),
        total: dashboard.total,
        upstream_total: dashboard.upstream_total,
        days: dashboard.query.days.get(),
        rank: dashboard.query.rank,
        regions: dashboard.query.regions.iter().collect(),
        sort: dashboard.query.sort,
        fetched_at: dashboard.fetched_at,
        rows: dashboard.rows,
    }))
}

/// `GET /api/heroes/chart`: scatter points with quadrants, means and axis
/// domains.
pub async fn hero_chart(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<ChartResponse>, ApiError> {
    let dashboard = load(&state, &params).await?;

    Ok(Json(ChartResponse {
        points: dashboard.chart,
        means: dashboard.means,
        domains: AxisDomains {
            pick: dashboard.pick_domain,
            win: dashboard.win_domain,
        },
        fetched_at: dashboard.fetched_at,
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::test_support::*;
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_heroes() {
        let (status, body) = get_json(build_router(test_state()), "/api/heroes").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 3);
        assert_eq!(body["total"], 3);
        assert_eq!(body["days"], 1);
        assert_eq!(body["rank"], "all");
        assert_eq!(body["regions"].as_array().unwrap().len(), 4);

        let layla = &body["rows"][0];
        assert_eq!(layla["main_heroid"], 1);
        assert_eq!(
            layla["relationTargets"],
            json!({
                "assist": [{"id": 2, "name": "Tigreal"}],
                "strong": [],
                "weak": [{"id": 3, "name": "Eudora"}]
            })
        );
        assert!(body["rows"][1].get("relationTargets").is_none());
    }

    #[tokio::test]
    async fn test_list_heroes_search_and_sort() {
        let (status, body) = get_json(
            build_router(test_state()),
            "/api/heroes?q=a&sort=pick_rate&order=asc&days=7&rank=glory",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let ids: Vec<u64> = body["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["main_heroid"].as_u64().unwrap())
            .collect();
        // Tigreal 0.2, Eudora 0.5, Layla 0.8
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(body["days"], 7);
        assert_eq!(body["rank"], "glory");
        assert_eq!(body["sort"], json!({"column": "pick_rate", "order": "asc"}));
    }

    #[tokio::test]
    async fn test_hero_chart() {
        let (status, body) = get_json(build_router(test_state()), "/api/heroes/chart").await;

        assert_eq!(status, StatusCode::OK);
        let points = body["points"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0]["hero"], "Layla");
        assert_eq!(points[0]["region"], "highPickHighWin");
        assert_eq!(points[1]["region"], "lowPickLowWin");
        assert_eq!(body["means"]["pick"], 50.0);
        assert_eq!(body["domains"]["pick"], json!([19.0, 81.0]));
    }

    #[tokio::test]
    async fn test_hero_chart_no_regions() {
        let (status, body) =
            get_json(build_router(test_state()), "/api/heroes/chart?regions=").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["points"].as_array().unwrap().is_empty());
        assert_eq!(body["means"]["win"], 50.0);
    }
}
