//! Categorize command

use anyhow::Result;
use tillscan_core::AppContext;

pub async fn cmd_categorize(ctx: &AppContext, description: &str, merchant: &str) -> Result<()> {
    let resolution = ctx.resolver().resolve(description, merchant).await;

    println!("{}", resolution.category);
    println!("   via {}", resolution.source);
    if !resolution.votes.is_empty() {
        println!("   keyword matches: {}", resolution.votes.describe());
    }
    Ok(())
}
