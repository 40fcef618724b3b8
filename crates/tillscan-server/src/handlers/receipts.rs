//! Receipt image handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::info;

use crate::{AppError, AppState, MAX_UPLOAD_SIZE};
use tillscan_core::ImageClassification;

/// POST /api/classify_image - Scan a receipt image and categorize it
///
/// Expects multipart form with:
/// - image: receipt image (required, max 10MB)
///
/// Unreadable images are not an error: the response carries the placeholder
/// merchant and description with an `unknown` category.
pub async fn classify_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ImageClassification>, AppError> {
    let mut image: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("Failed to read image data"))?;

        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(AppError::bad_request(&format!(
                "Image too large. Maximum size is {} MB",
                MAX_UPLOAD_SIZE / 1024 / 1024
            )));
        }

        image = Some(bytes.to_vec());
    }

    let image = image.ok_or_else(|| AppError::bad_request("No image uploaded"))?;

    let result = state.ctx.pipeline.classify_image(&image).await;
    info!(
        bytes = image.len(),
        category = %result.expense.category,
        amount = result.expense.amount,
        "Classified receipt image"
    );

    Ok(Json(result))
}
