//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `classify` - Categorize an expense from text
//! - `expenses` - Ledger commands (list, add, summary)
//! - `receipts` - Receipt workflow commands (extract, scan)
//! - `serve` - Web server command
//! - `status` - Classification backend status

pub mod classify;
pub mod expenses;
pub mod receipts;
pub mod serve;
pub mod status;

// Re-export command functions for main.rs
pub use classify::*;
pub use expenses::*;
pub use receipts::*;
pub use serve::*;
pub use status::*;

use std::path::Path;

use anyhow::{Context, Result};
use tillscan_core::{AppContext, Config, ExpenseLedger};

/// Resolve configuration, applying the `--ledger` override last
pub fn load_config(config_path: Option<&Path>, ledger: Option<&Path>) -> Result<Config> {
    let mut config = Config::load(config_path).context("Failed to load configuration")?;
    if let Some(path) = ledger {
        config.ledger.path = path.to_path_buf();
    }
    Ok(config)
}

/// Build the shared context (classification backend, OCR engine, ledger)
pub fn open_context(config: Config) -> Result<AppContext> {
    AppContext::from_config(config).context("Failed to initialize tillscan")
}

/// Ledger only, for commands that never classify
pub fn open_ledger(config: &Config) -> ExpenseLedger {
    ExpenseLedger::new(config.ledger.path.clone())
}

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
