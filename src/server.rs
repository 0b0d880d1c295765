//! HTTP service exposing price extraction.

use crate::error::ExtractError;
use crate::extract::Extractor;
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<Extractor>,
}

/// Query string of `GET /price`.
#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub url: String,
    #[serde(default)]
    pub debug: Option<String>,
}

/// Error response with a `{"detail": ...}` body.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self { status, detail: detail.into() }
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Builds the router around a shared extractor.
pub fn build_router(extractor: Arc<Extractor>) -> Router {
    Router::new()
        .route("/price", get(get_price))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { extractor })
}

/// Serves until ctrl-c or SIGTERM.
pub async fn serve(bind: &str, extractor: Arc<Extractor>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    let addr = listener.local_addr().context("Failed to read listener address")?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, build_router(extractor))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn get_price(
    State(state): State<AppState>,
    query: Result<Query<PriceQuery>, QueryRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Query(query) = query?;
    let debug = parse_debug(query.debug.as_deref())?;
    let record = state.extractor.extract(&query.url, debug).await?;

    let body = serde_json::to_value(&record).map_err(|e| {
        error!("Failed to encode record for {}: {}", query.url, e);
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "failed to encode price record")
    })?;
    Ok(Json(body))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "cached": state.extractor.cached_len() }))
}

/// Accepts only `0` and `1`; absent means off.
fn parse_debug(raw: Option<&str>) -> Result<bool, ApiError> {
    match raw {
        None | Some("0") => Ok(false),
        Some("1") => Ok(true),
        Some(other) => Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("debug must be 0 or 1, got '{}'", other),
        )),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::extract::testing::{raw, FakePage, MockLoader, BLACK, RED};
    use crate::extract::ExtractSettings;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    const CERVEZA: &str = "https://www.alsuper.com/producto/cerveza-six-pack-lata-355ml-44120";

    fn make_app(loader: MockLoader) -> (Router, Arc<Extractor>) {
        let clock = Arc::new(ManualClock::new());
        let extractor =
            Arc::new(Extractor::with_clock(Arc::new(loader), ExtractSettings::default(), clock));
        (build_router(extractor.clone()), extractor)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");

        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_price_ok() {
        let page = FakePage::new(Some("Cerveza Six Pack"))
            .with_candidates(vec![raw("$129.00", RED, false), raw("$149.00", BLACK, false)]);
        let (app, _) = make_app(MockLoader::serving(page));

        let (status, json) = get_json(app, &format!("/price?url={}", CERVEZA)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["url"], CERVEZA);
        assert_eq!(json["product_name"], "Cerveza Six Pack");
        assert_eq!(json["unit_price"], 129.0);
        assert_eq!(json["price_per_kg"], serde_json::Value::Null);
        assert_eq!(json["unit_pack_size"], 6);
        assert_eq!(json["raw_unit"], "six-pack");
        assert_eq!(json["currency"], "MXN");
    }

    #[tokio::test]
    async fn test_price_debug_flag() {
        let page = FakePage::new(None).with_candidates(vec![raw("$129.00", RED, false)]);
        let (app, _) = make_app(MockLoader::serving(page));

        let (status, json) = get_json(app, &format!("/price?url={}&debug=1", CERVEZA)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["product_name"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_price_load_failure_is_502() {
        let (app, extractor) = make_app(MockLoader::failing("Timeout 120000ms exceeded"));

        let (status, json) = get_json(app, &format!("/price?url={}", CERVEZA)).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let detail = json["detail"].as_str().unwrap();
        assert!(detail.contains(CERVEZA));
        assert!(detail.contains("Timeout 120000ms exceeded"));
        assert_eq!(extractor.cached_len(), 0);
    }

    #[tokio::test]
    async fn test_price_not_found_is_500() {
        let page = FakePage::new(Some("Cerveza")).with_candidates(vec![]);
        let (app, _) = make_app(MockLoader::serving(page));

        let (status, json) = get_json(app, &format!("/price?url={}", CERVEZA)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["detail"].as_str().unwrap().contains("no visible non-struck"));
    }

    #[tokio::test]
    async fn test_invalid_debug_is_422() {
        for bad in ["2", "yes", "-1", ""] {
            let page = FakePage::new(None).with_candidates(vec![raw("$1.00", RED, false)]);
            let (app, extractor) = make_app(MockLoader::serving(page));

            let uri = format!("/price?url={}&debug={}", CERVEZA, bad);
            let (status, json) = get_json(app, &uri).await;

            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "debug={bad}");
            assert!(json["detail"].as_str().unwrap().contains("debug must be 0 or 1"));
            assert_eq!(extractor.cached_len(), 0);
        }
    }

    #[tokio::test]
    async fn test_missing_url_is_422() {
        let (app, _) = make_app(MockLoader::failing("unused"));

        let (status, json) = get_json(app, "/price?debug=1").await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["detail"].as_str().unwrap().contains("url"));
    }

    #[tokio::test]
    async fn test_health_reports_cache_size() {
        let page = FakePage::new(None).with_candidates(vec![raw("$129.00", RED, false)]);
        let (app, _) = make_app(MockLoader::serving(page));

        let (status, json) = get_json(app.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "status": "ok", "cached": 0 }));

        get_json(app.clone(), &format!("/price?url={}", CERVEZA)).await;
        let (_, json) = get_json(app, "/health").await;
        assert_eq!(json["cached"], 1);
    }

    #[test]
    fn test_parse_debug() {
        assert!(!parse_debug(None).unwrap());
        assert!(!parse_debug(Some("0")).unwrap());
        assert!(parse_debug(Some("1")).unwrap());
        assert!(parse_debug(Some("true")).is_err());
    }
}
