use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use url::Url;

use crate::api::state::AppState;
use crate::api::ApiError;

const DEFAULT_CONTENT_TYPE: &str = "image/png";

#[derive(Debug, Deserialize)]
pub struct ImageProxyParams {
    pub src: Option<String>,
}

/// Validate a proxy target: absolute http(s) URL on an allowed host.
pub fn validate_source(src: Option<&str>, allowed: impl Fn(&str) -> bool) -> Result<Url, ApiError> {
    let src = src
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing src parameter".to_string()))?;

    let url = Url::parse(src).map_err(|e| ApiError::BadRequest(format!("invalid src: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::BadRequest(format!(
            "unsupported scheme: {}",
            url.scheme()
        )));
    }

    let host = url
        .host_str()
        .ok_or_else(|| ApiError::BadRequest("src has no host".to_string()))?;
    if !allowed(host) {
        return Err(ApiError::Forbidden(format!("host not allowed: {}", host)));
    }

    Ok(url)
}

/// `GET /api/image-proxy?src=`: relay hero portraits from allowed CDNs.
pub async fn image_proxy(
    State(state): State<AppState>,
    Query(params): Query<ImageProxyParams>,
) -> Result<Response, ApiError> {
    let url = validate_source(params.src.as_deref(), |host| {
        state.config.images.is_allowed(host)
    })?;

    let mut response = state.http.get(url.as_str()).send().await.map_err(|e| {
        tracing::warn!("Image fetch failed for {}: {}", url, e);
        ApiError::BadGateway(format!("failed to fetch image: {}", e))
    })?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!("Image upstream returned {} for {}", status, url);
        let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        return Err(ApiError::UpstreamStatus { status });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| HeaderValue::from_str(v).ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let max_bytes = state.config.images.max_bytes;
    if let Some(length) = response.content_length() {
        if length > max_bytes as u64 {
            tracing::warn!("Image {} declares {} bytes, over the cap", url, length);
            return Err(too_large(max_bytes));
        }
    }

    // Content-Length may be absent or wrong, so the cap also holds per chunk.
    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| ApiError::BadGateway(format!("failed to read image: {}", e)))?
    {
        if bytes.len() + chunk.len() > max_bytes {
            tracing::warn!("Image {} exceeded {} bytes while reading", url, max_bytes);
            return Err(too_large(max_bytes));
        }
        bytes.extend_from_slice(&chunk);
    }

    let cache_control = HeaderValue::from_str(&format!(
        "public, max-age={}",
        state.config.images.cache_seconds
    ))
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, cache_control),
        ],
        bytes,
    )
        .into_response())
}

fn too_large(max_bytes: usize) -> ApiError {
    ApiError::BadGateway(format!("image exceeds {} bytes", max_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::build_router;
    use crate::api::test_support::*;
    use crate::config::AppConfig;
    use crate::fetch::test_server::{CannedResponse, TestServer};

    fn allow_cdn(host: &str) -> bool {
        host == "akmweb.youngjoygame.com"
    }

    #[test]
    fn test_validate_source() {
        assert!(matches!(
            validate_source(None, allow_cdn),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            validate_source(Some("  "), allow_cdn),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            validate_source(Some("not a url"), allow_cdn),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            validate_source(Some("file:///etc/passwd"), allow_cdn),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            validate_source(Some("https://evil.example.com/a.png"), allow_cdn),
            Err(ApiError::Forbidden(_))
        ));

        let url = validate_source(Some("https://akmweb.youngjoygame.com/a.png"), allow_cdn).unwrap();
        assert_eq!(url.path(), "/a.png");
    }

    #[tokio::test]
    async fn test_proxy_missing_src() {
        let (status, body) = get_json(build_router(test_state()), "/api/image-proxy").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_proxy_forbidden_host() {
        let (status, body) = get_json(
            build_router(test_state()),
            "/api/image-proxy?src=https%3A%2F%2Fexample.com%2Fa.png",
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_proxy_unreachable_upstream() {
        let mut config = AppConfig::default();
        config.images.allowed_hosts = vec!["127.0.0.1".to_string()];
        config.upstream.timeout_seconds = 2;
        let app = build_router(state_with(fixture_source(), config));

        let (status, body) = get_json(
            app,
            "/api/image-proxy?src=http%3A%2F%2F127.0.0.1%3A9%2Fa.png",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "BAD_GATEWAY");
    }

    fn local_image_state(max_bytes: usize) -> AppState {
        let mut config = AppConfig::default();
        config.images.allowed_hosts = vec!["127.0.0.1".to_string()];
        config.images.max_bytes = max_bytes;
        config.upstream.timeout_seconds = 2;
        state_with(fixture_source(), config)
    }

    fn proxy_uri(server: &TestServer) -> String {
        format!(
            "/api/image-proxy?src=http%3A%2F%2F{}%2Fhero.png",
            server.addr.to_string().replace(':', "%3A")
        )
    }

    #[tokio::test]
    async fn test_proxy_relays_image() {
        let server = TestServer::start(vec![CannedResponse::new(200)
            .header("Content-Type", "image/webp")
            .body(vec![7u8; 512])])
        .await;
        let app = build_router(local_image_state(1024));

        let (status, headers, body) = get(app, &proxy_uri(&server)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "image/webp");
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=3600");
        assert_eq!(body, vec![7u8; 512]);
    }

    #[tokio::test]
    async fn test_proxy_rejects_oversized_image() {
        let server = TestServer::start(vec![CannedResponse::new(200)
            .header("Content-Type", "image/png")
            .body(vec![0u8; 4096])])
        .await;
        let app = build_router(local_image_state(1024));

        let (status, body) = get_json(app, &proxy_uri(&server)).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "BAD_GATEWAY");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("1024 bytes"));
    }

    #[tokio::test]
    async fn test_proxy_caps_image_without_length() {
        let server = TestServer::start(vec![CannedResponse::new(200)
            .header("Content-Type", "image/png")
            .body(vec![0u8; 4096])
            .close_delimited()])
        .await;
        let app = build_router(local_image_state(1024));

        let (status, body) = get_json(app, &proxy_uri(&server)).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "BAD_GATEWAY");
    }

    #[tokio::test]
    async fn test_proxy_passes_upstream_status() {
        let server = TestServer::start(vec![CannedResponse::new(404)]).await;
        let app = build_router(local_image_state(1024));

        let (status, _, _) = get(app, &proxy_uri(&server)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
