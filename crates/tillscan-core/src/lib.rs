//! Tillscan Core Library
//!
//! Receipt scanning and expense categorization:
//! - Field extraction from noisy OCR text (amount, merchant, description)
//! - Keyword voting over a fixed set of spending categories
//! - Escalation to a local model server when keywords are ambiguous, with a
//!   deterministic fallback ladder
//! - Tesseract-backed text extraction
//! - CSV expense ledger and spending summaries
//! - Layered TOML/env configuration

pub mod ai;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod insights;
pub mod keywords;
pub mod ledger;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod prompts;
pub mod resolver;

/// Test utilities including a mock model server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIClient, ClassificationService, MockBackend, MockResponse, OllamaBackend,
    OpenAICompatibleBackend, ServiceStatus,
};
pub use config::Config;
pub use context::AppContext;
pub use error::{Error, Result};
pub use extract::extract_fields;
pub use insights::{recommendations, summarize};
pub use keywords::keyword_votes;
pub use ledger::ExpenseLedger;
pub use models::{
    Category, CategoryTotal, CategoryVotes, ClassifiedExpense, ExtractedFields,
    ImageClassification, SpendingSummary,
};
pub use ocr::{OcrEngine, TextExtractor};
pub use pipeline::ReceiptPipeline;
pub use prompts::{Prompt, PromptId, PromptLibrary};
pub use resolver::{
    fallback_category, CategoryResolver, FallbackReason, Resolution, ResolutionSource,
};
