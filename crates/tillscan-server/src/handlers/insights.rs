//! Spending insight handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{AppError, AppState};
use tillscan_core::{recommendations, summarize, SpendingSummary};

/// Response for GET /api/recommendations
#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<String>,
}

/// GET /api/recommendations - Spending tips derived from the ledger
pub async fn get_recommendations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RecommendationsResponse>, AppError> {
    let expenses = state.ctx.ledger.read_all()?;
    Ok(Json(RecommendationsResponse {
        recommendations: recommendations(&expenses),
    }))
}

/// GET /api/summary - Per-category totals
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SpendingSummary>, AppError> {
    let expenses = state.ctx.ledger.read_all()?;
    Ok(Json(summarize(&expenses)))
}
