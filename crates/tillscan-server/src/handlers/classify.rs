//! Manual classification handlers

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{json_body, required, AmountInput};
use crate::{AppError, AppState};
use tillscan_core::{extract_fields, ClassifiedExpense, ExtractedFields, ResolutionSource};

/// Request body for POST /api/classify
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub amount: Option<AmountInput>,
    pub merchant: Option<String>,
    pub description: Option<String>,
}

/// Response for POST /api/classify
#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    #[serde(flatten)]
    pub expense: ClassifiedExpense,
    #[serde(flatten)]
    pub source: ResolutionSource,
}

/// POST /api/classify - Categorize a manually entered expense
pub async fn classify_expense(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<ClassifyResponse>, AppError> {
    let req = json_body(body)?;
    let amount = required(req.amount, "amount")?.to_amount()?;
    let merchant = required(req.merchant, "merchant")?;
    let description = required(req.description, "description")?;

    let resolution = state.ctx.resolver().resolve(&description, &merchant).await;

    Ok(Json(ClassifyResponse {
        expense: ClassifiedExpense {
            amount,
            merchant,
            description,
            category: resolution.category,
        },
        source: resolution.source,
    }))
}

/// Request body for POST /api/extract
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: Option<String>,
}

/// POST /api/extract - Pull amount, merchant and description out of receipt text
pub async fn extract_text(
    body: Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<Json<ExtractedFields>, AppError> {
    let req = json_body(body)?;
    let text = required(req.text, "text")?;
    Ok(Json(extract_fields(&text)))
}
