// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// Read-only view of the scout under `/api/v1/`.  The engine publishes into
// AppState; these handlers only clone out of it.
//
// CORS is configured permissively; the view carries no secrets.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::AppState;

// =============================================================================
// Router construction
// =============================================================================

/// Build the REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/classification", get(classification))
        .route("/api/v1/errors", get(errors))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    cycles_completed: u64,
    uptime_secs: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        cycles_completed: state
            .cycles_completed
            .load(std::sync::atomic::Ordering::Relaxed),
        uptime_secs: state.uptime_secs(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Latest classification (null before the first successful cycle)
// =============================================================================

async fn classification(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.latest())
}

// =============================================================================
// Recent errors
// =============================================================================

async fn errors(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.recent_errors())
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use tower::ServiceExt;

    use crate::types::{ClassificationResult, Mover};

    async fn get_json(state: Arc<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = get_json(Arc::new(AppState::new()), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cycles_completed"], 0);
    }

    #[tokio::test]
    async fn classification_is_null_before_first_cycle() {
        let (status, body) = get_json(Arc::new(AppState::new()), "/api/v1/classification").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn classification_serves_latest_result() {
        let state = Arc::new(AppState::new());
        let mut result = ClassificationResult::empty(Utc::now());
        result.top_hot.push(Mover {
            name: "Bitcoin".into(),
            symbol: "BTC".into(),
            change_pct: 2.5,
        });
        state.publish(result);

        let (_, body) = get_json(state, "/api/v1/classification").await;
        assert_eq!(body["top_hot"][0]["symbol"], "BTC");
        assert_eq!(body["top_hot"][0]["change_pct"], 2.5);
        assert!(body["buy_candidates"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn errors_lists_recorded_failures() {
        let state = Arc::new(AppState::new());
        state.push_error_with_code("listings endpoint returned 401".into(), Some("provider".into()));

        let (_, body) = get_json(state, "/api/v1/errors").await;
        let errors = body.as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["code"], "provider");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let resp = router(Arc::new(AppState::new()))
            .oneshot(Request::builder().uri("/api/v1/state").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
