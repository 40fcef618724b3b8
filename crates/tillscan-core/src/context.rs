//! Application context
//!
//! Built once from a resolved `Config` and shared (behind an `Arc`) by the
//! HTTP handlers and CLI commands. Holds no mutable state; the ledger file is
//! the only shared resource.

use tracing::{info, warn};

use crate::ai::{AIClient, ClassificationService};
use crate::config::Config;
use crate::error::Result;
use crate::ledger::ExpenseLedger;
use crate::ocr::OcrEngine;
use crate::pipeline::ReceiptPipeline;
use crate::prompts::PromptLibrary;
use crate::resolver::CategoryResolver;

/// Everything a request needs
pub struct AppContext {
    pub config: Config,
    pub pipeline: ReceiptPipeline,
    pub ledger: ExpenseLedger,
}

impl AppContext {
    /// Wire up collaborators from configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let ai = AIClient::from_config(&config.ai)?;
        match ai {
            Some(ref client) => info!(
                backend = client.backend_name(),
                host = client.host(),
                model = client.model(),
                "Classification service configured"
            ),
            None => warn!("No classification service configured, ambiguous receipts use keyword fallback"),
        }

        let resolver = CategoryResolver::new(ai, &mut PromptLibrary::new())?;
        let ocr = OcrEngine::from_config(&config.ocr);
        let ledger = ExpenseLedger::new(config.ledger.path.clone());

        Ok(Self::new(config, ReceiptPipeline::new(ocr, resolver), ledger))
    }

    /// Assemble a context from prebuilt parts
    pub fn new(config: Config, pipeline: ReceiptPipeline, ledger: ExpenseLedger) -> Self {
        Self {
            config,
            pipeline,
            ledger,
        }
    }

    pub fn resolver(&self) -> &CategoryResolver {
        self.pipeline.resolver()
    }

    pub fn ai(&self) -> Option<&AIClient> {
        self.pipeline.resolver().ai()
    }
}
