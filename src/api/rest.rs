// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`.  The board is read-only apart from the
// query, which is forwarded to the pipeline's coalescing sink and applied
// asynchronously; callers watch `/markets` or the WebSocket for the result.
//
// CORS is permissive.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

use crate::api::ApiState;
use crate::types::PlatformStatus;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full API router with CORS middleware and shared state.
pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/markets", get(markets))
        .route("/api/v1/query", post(submit_query))
        .route("/api/v1/platform", get(platform))
        // ── WebSocket (handled in the ws module but mounted here) ───
        .route("/api/v1/ws", get(crate::api::ws::ws_handler))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Board
// =============================================================================

async fn markets(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(state.board())
}

#[derive(Deserialize)]
struct QueryRequest {
    #[serde(default)]
    query: String,
}

async fn submit_query(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<QueryRequest>,
) -> impl IntoResponse {
    debug!(query = %request.query, "query submitted over REST");
    state.query_sink.submit(request.query.clone());
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "query": request.query })),
    )
}

// =============================================================================
// Platform status
// =============================================================================

#[derive(Serialize)]
struct PlatformResponse {
    status: PlatformStatus,
    operative: bool,
}

async fn platform(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match state.platform.fetch_platform_status().await {
        Ok(status) => Json(PlatformResponse {
            status,
            operative: status == PlatformStatus::Operative,
        })
        .into_response(),
        Err(e) => {
            warn!(error = %e, "platform status unavailable");
            let body = serde_json::json!({ "error": format!("{e:#}") });
            (StatusCode::BAD_GATEWAY, Json(body)).into_response()
        }
    }
}
