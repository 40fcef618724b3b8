//! Receipt pipeline: OCR, field extraction, category resolution

use tracing::info;

use crate::extract::extract_fields;
use crate::models::{ClassifiedExpense, ImageClassification};
use crate::ocr::{OcrEngine, TextExtractor};
use crate::resolver::CategoryResolver;

/// Turns receipt images (or their text) into classified expenses
pub struct ReceiptPipeline {
    ocr: OcrEngine,
    resolver: CategoryResolver,
}

impl ReceiptPipeline {
    pub fn new(ocr: OcrEngine, resolver: CategoryResolver) -> Self {
        Self { ocr, resolver }
    }

    pub fn ocr(&self) -> &OcrEngine {
        &self.ocr
    }

    pub fn resolver(&self) -> &CategoryResolver {
        &self.resolver
    }

    /// Classify a receipt image; empty or garbled text yields sentinels
    pub async fn classify_image(&self, image: &[u8]) -> ImageClassification {
        let text = self.ocr.extract(image).await;
        info!(
            bytes = image.len(),
            chars = text.chars().count(),
            engine = self.ocr.name(),
            "OCR complete"
        );
        self.classify_text(&text).await
    }

    /// Classify already-extracted receipt text
    pub async fn classify_text(&self, text: &str) -> ImageClassification {
        let fields = extract_fields(text);
        let category = self
            .resolver
            .predict_category(&fields.description, &fields.merchant)
            .await;

        ImageClassification {
            expense: ClassifiedExpense::from_fields(fields, category),
            raw_text: text.to_string(),
        }
    }
}
