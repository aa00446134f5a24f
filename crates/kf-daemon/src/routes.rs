//! Axum router and all HTTP handlers for kf-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers, and the scenario tests in `tests/` compose the bare
//! router directly.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::error;

use crate::api_types::{ErrorResponse, HealthResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/api/kalshi", get(kalshi_portfolio))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /api/kalshi
// ---------------------------------------------------------------------------

/// The aggregate portfolio view.
///
/// Serves from cache when the portfolio snapshot is fresh; otherwise
/// refreshes upstream. An upstream failure on the snapshot path surfaces as
/// 502 with the upstream message attached. Event and commentary failures
/// never reach here; they degrade inside the aggregator.
async fn kalshi_portfolio(State(st): State<Arc<AppState>>) -> Response {
    match st.aggregator.snapshot().await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            error!(error = %e, "portfolio aggregation failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: format!("upstream fetch failed: {e}"),
                }),
            )
                .into_response()
        }
    }
}
