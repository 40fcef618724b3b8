//! Expense ledger handlers

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use tracing::info;

use super::{json_body, required, AmountInput};
use crate::{AppError, AppState, SuccessResponse};
use tillscan_core::{Category, ClassifiedExpense};

/// Request body for POST /api/save_expense
#[derive(Debug, Deserialize)]
pub struct SaveExpenseRequest {
    pub amount: Option<AmountInput>,
    pub merchant: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// POST /api/save_expense - Append a confirmed expense to the ledger
pub async fn save_expense(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SaveExpenseRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let req = json_body(body)?;
    let amount = required(req.amount, "amount")?.to_amount()?;
    let merchant = required(req.merchant, "merchant")?;
    let description = required(req.description, "description")?;
    let category: Category = required(req.category, "category")?
        .parse()
        .map_err(|e: String| AppError::bad_request(&e))?;

    let expense = ClassifiedExpense {
        amount,
        merchant,
        description,
        category,
    };
    state.ctx.ledger.append(&expense)?;

    info!(category = %expense.category, amount = expense.amount, "Saved expense");

    Ok(Json(SuccessResponse::success()))
}

/// GET /api/get_expenses - List ledger rows in insertion order
pub async fn get_expenses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ClassifiedExpense>>, AppError> {
    let expenses = state.ctx.ledger.read_all()?;
    Ok(Json(expenses))
}
