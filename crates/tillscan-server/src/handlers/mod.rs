//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod classify;
pub mod expenses;
pub mod health;
pub mod insights;
pub mod receipts;

// Re-export all handlers for use in router
pub use classify::*;
pub use expenses::*;
pub use health::*;
pub use insights::*;
pub use receipts::*;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Deserialize;

use crate::AppError;

/// An amount as sent by browsers: either a JSON number or a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    pub fn to_amount(&self) -> Result<f64, AppError> {
        let value = match self {
            AmountInput::Number(n) => *n,
            AmountInput::Text(s) => s
                .trim()
                .trim_start_matches('$')
                .replace(',', "")
                .parse::<f64>()
                .map_err(|_| AppError::bad_request(&format!("Invalid amount: {}", s)))?,
        };
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::bad_request("Amount must be a non-negative number"));
        }
        Ok(value)
    }
}

/// Unwrap a JSON body, turning axum's rejection into a 400 with a JSON error
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|e| AppError::bad_request(&format!("Invalid request body: {}", e.body_text())))
}

/// Require an optional request field
pub(crate) fn required<T>(value: Option<T>, name: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::bad_request(&format!("Missing field: {}", name)))
}

/// Fallback for unknown API paths
pub async fn api_not_found() -> AppError {
    AppError::not_found("Not found")
}
