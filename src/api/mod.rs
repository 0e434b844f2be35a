//! HTTP server.
//!
//! Axum router serving the server-rendered dashboard, its JSON API and the
//! hero image proxy.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::source::SourceError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Upstream error: {0}")]
    BadGateway(String),

    /// Upstream answered with a non-success status that is passed through.
    #[error("Upstream returned {status}")]
    UpstreamStatus { status: StatusCode },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::UpstreamStatus { status } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::BadGateway(_) | ApiError::UpstreamStatus { .. } => "BAD_GATEWAY",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<SourceError> for ApiError {
    fn from(err: SourceError) -> Self {
        ApiError::BadGateway(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };

        (self.status(), Json(body)).into_response()
    }
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            tracing::warn!("Invalid cors_origin {:?}, allowing any origin", origin);
            layer.allow_origin(Any)
        }
    }
}

async fn not_found() -> ApiError {
    ApiError::NotFound("no such route".to_string())
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/", get(routes::dashboard::dashboard_page))
        .route("/health", get(routes::health::health))
        .route("/api/heroes", get(routes::heroes::list_heroes))
        .route("/api/heroes/chart", get(routes::heroes::hero_chart))
        .route("/api/image-proxy", get(routes::images::image_proxy))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use super::state::AppState;
    use crate::config::AppConfig;
    use crate::models::{HeroListRecord, HeroRankQuery, HeroRankRecord};
    use crate::source::{HeroListPage, HeroRankPage, SourceError, StaticSource, StatsSource};

    /// Source that always fails, standing in for an unreachable upstream.
    pub struct FailingSource;

    #[async_trait]
    impl StatsSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn hero_list(&self) -> Result<HeroListPage, SourceError> {
            Err(SourceError::Upstream {
                code: 500,
                message: "upstream down".to_string(),
            })
        }

        async fn hero_rankings(&self, _query: &HeroRankQuery) -> Result<HeroRankPage, SourceError> {
            Err(SourceError::Upstream {
                code: 500,
                message: "upstream down".to_string(),
            })
        }
    }

    pub fn fixture_source() -> StaticSource {
        let heroes: Vec<HeroListRecord> = serde_json::from_value(json!([
            {
                "hero_id": 1,
                "hero": {"data": {"name": "Layla", "head": "https://akmweb.youngjoygame.com/layla.png"}},
                "relation": {"assist": {"target_hero_id": [2]}, "weak": {"target_hero_id": [3, 3]}}
            },
            {"hero_id": 2, "hero": {"data": {"name": "Tigreal"}}},
            {"hero_id": 3, "hero": {"data": {"name": "Eudora"}}}
        ]))
        .unwrap();
        let rankings: Vec<HeroRankRecord> = serde_json::from_value(json!([
            {"main_heroid": 1, "main_hero": {"data": {"name": "Layla"}},
             "main_hero_appearance_rate": 0.8, "main_hero_win_rate": 0.6, "main_hero_ban_rate": 0.1},
            {"main_heroid": 2, "main_hero": {"data": {"name": "Tigreal"}},
             "main_hero_appearance_rate": 0.2, "main_hero_win_rate": 0.4, "main_hero_ban_rate": 0.0},
            {"main_heroid": 3, "main_hero": {"data": {"name": "Eudora"}},
             "main_hero_appearance_rate": 0.5, "main_hero_win_rate": "n/a"}
        ]))
        .unwrap();
        StaticSource::new(heroes, rankings)
    }

    pub fn state_with(source: impl StatsSource + 'static, config: AppConfig) -> AppState {
        AppState::new(Arc::new(source), Arc::new(config)).unwrap()
    }

    pub fn test_state() -> AppState {
        state_with(fixture_source(), AppConfig::default())
    }

    pub async fn get(app: axum::Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, body.to_vec())
    }

    pub async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let (status, _, body) = get(app, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::BadGateway("x".into()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ApiError::UpstreamStatus {
                status: StatusCode::NOT_FOUND
            }
            .status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let app = build_router(test_state());
        let (status, body) = get_json(app, "/nope").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_source_error_maps_to_bad_gateway() {
        let app = build_router(state_with(FailingSource, crate::config::AppConfig::default()));
        let (status, body) = get_json(app, "/api/heroes").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "BAD_GATEWAY");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("upstream down"));
    }

    #[tokio::test]
    async fn test_cors_header_present() {
        let app = build_router(test_state());
        let resp = tower::util::ServiceExt::oneshot(
            app,
            axum::http::Request::builder()
                .uri("/health")
                .header("origin", "https://example.com")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(
            resp.headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }
}
