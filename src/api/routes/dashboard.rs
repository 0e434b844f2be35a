use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::api::state::AppState;
use crate::dashboard::{Dashboard, DashboardParams, DashboardQuery};
use crate::render::{render_dashboard, render_error_page};

/// `GET /`: the server-rendered dashboard.
pub async fn dashboard_page(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Response {
    let query = DashboardQuery::from(&params);

    match Dashboard::load(
        state.source.as_ref(),
        query,
        state.config.upstream.ranking_page_size,
    )
    .await
    {
        Ok(dashboard) => Html(render_dashboard(&dashboard, &state.page)).into_response(),
        Err(e) => {
            tracing::error!("Failed to load hero data from {}: {}", state.source.name(), e);
            (
                StatusCode::BAD_GATEWAY,
                Html(render_error_page(
                    "Hero data is unavailable",
                    &format!("The stats API could not be reached: {}", e),
                )),
            )
                .into_response()
        }
    }
}
