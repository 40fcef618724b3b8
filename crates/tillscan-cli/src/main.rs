//! Tillscan CLI - Receipt scanner and expense tracker
//!
//! Usage:
//!   tillscan scan receipt.png --save     OCR, categorize and record a receipt
//!   tillscan categorize -d "coffee" -m "Cafe"
//!   tillscan summary                     Spending totals and tips
//!   tillscan serve --port 5000           Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Extract { input, json } => commands::cmd_extract(&input, json),
        Commands::Categorize {
            description,
            merchant,
        } => {
            let config = commands::load_config(cli.config.as_deref(), cli.ledger.as_deref())?;
            let ctx = commands::open_context(config)?;
            commands::cmd_categorize(&ctx, &description, &merchant).await
        }
        Commands::Scan { image, save, json } => {
            let config = commands::load_config(cli.config.as_deref(), cli.ledger.as_deref())?;
            let ctx = commands::open_context(config)?;
            commands::cmd_scan(&ctx, &image, save, json).await
        }
        Commands::Expenses { action } => {
            let config = commands::load_config(cli.config.as_deref(), cli.ledger.as_deref())?;
            match action {
                None | Some(ExpensesAction::List) => {
                    commands::cmd_expenses_list(&commands::open_ledger(&config))
                }
                Some(ExpensesAction::Add {
                    amount,
                    merchant,
                    description,
                    category,
                }) => {
                    let ctx = commands::open_context(config)?;
                    commands::cmd_expenses_add(
                        &ctx,
                        amount,
                        &merchant,
                        &description,
                        category.as_deref(),
                    )
                    .await
                }
            }
        }
        Commands::Summary => {
            let config = commands::load_config(cli.config.as_deref(), cli.ledger.as_deref())?;
            commands::cmd_summary(&commands::open_ledger(&config))
        }
        Commands::AiStatus => {
            let config = commands::load_config(cli.config.as_deref(), cli.ledger.as_deref())?;
            commands::cmd_ai_status(&config).await
        }
        Commands::Serve {
            port,
            host,
            static_dir,
        } => {
            let mut config =
                commands::load_config(cli.config.as_deref(), cli.ledger.as_deref())?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(dir) = static_dir {
                config.server.static_dir = Some(dir);
            }
            commands::cmd_serve(config).await
        }
    }
}
