//! `GET /health` — liveness.

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use chrono::Utc;
use serde::Serialize;

use crate::demo;
use crate::metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: chrono::DateTime<Utc>,
    pub service: &'static str,
    pub version: &'static str,
}

pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    metrics::inc_request("health", "200");
    let timestamp = if state.config.demo_fixed_timestamps { demo::fixed_timestamp() } else { Utc::now() };

    Json(HealthResponse {
        status: "healthy",
        timestamp,
        service: "genai-audit-query-processor",
        version: env!("CARGO_PKG_VERSION"),
    })
}
