//! Health check handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use tillscan_core::ServiceStatus;

/// Response for GET /api/health
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Classification backend, `null` when none is configured
    pub ai: Option<ServiceStatus>,
    /// Text extraction engine name
    pub ocr: &'static str,
}

/// GET /api/health - Server liveness plus a live probe of the AI backend
///
/// Always 200: an unreachable backend only degrades classification.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ai = match state.ctx.ai() {
        Some(client) => Some(client.status().await),
        None => None,
    };

    Json(HealthResponse {
        status: "ok",
        ai,
        ocr: state.ctx.pipeline.ocr().name(),
    })
}
