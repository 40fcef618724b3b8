//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tillscan - Scan receipts and track where the money goes
#[derive(Parser)]
#[command(name = "tillscan")]
#[command(about = "Receipt scanning and expense categorization", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to <data dir>/tillscan/config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Expense ledger CSV (overrides config and TILLSCAN_LEDGER)
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract amount, merchant and description from receipt text
    Extract {
        /// Text file to read, or "-" for stdin
        input: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Categorize an expense from its description and merchant
    Categorize {
        /// What was bought
        #[arg(short, long, default_value = "")]
        description: String,

        /// Where it was bought
        #[arg(short, long, default_value = "")]
        merchant: String,
    },

    /// OCR a receipt image and categorize it
    Scan {
        /// Receipt image file
        image: PathBuf,

        /// Append the result to the ledger
        #[arg(long)]
        save: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List or add ledger expenses
    Expenses {
        #[command(subcommand)]
        action: Option<ExpensesAction>,
    },

    /// Show per-category totals and spending tips
    Summary,

    /// Check the classification backend
    AiStatus,

    /// Start the web server
    Serve {
        /// Port to listen on (default from config: 5000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (default from config: 127.0.0.1)
        #[arg(long)]
        host: Option<String>,

        /// Directory containing static files to serve
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ExpensesAction {
    /// List recorded expenses
    List,

    /// Record an expense
    Add {
        /// Amount spent
        #[arg(short, long)]
        amount: f64,

        /// Merchant name
        #[arg(short, long)]
        merchant: String,

        /// Description of the purchase
        #[arg(short, long)]
        description: String,

        /// Category (food, transport, technology, shopping, entertainment, unknown).
        /// Categorized automatically when omitted.
        #[arg(short, long)]
        category: Option<String>,
    },
}
