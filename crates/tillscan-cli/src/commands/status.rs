//! Classification backend status command

use anyhow::{Context, Result};
use tillscan_core::{AIClient, Config};

pub async fn cmd_ai_status(config: &Config) -> Result<()> {
    println!();
    println!("🤖 Classification Backend");
    println!("   ─────────────────────────────────────────────");
    println!("   Backend: {}", config.ai.backend);
    println!("   Timeout: {}s", config.ai.timeout.as_secs());

    let client =
        AIClient::from_config(&config.ai).context("Failed to configure classification backend")?;

    let Some(client) = client else {
        println!("   Status:  not configured");
        println!();
        println!("   Ambiguous receipts are categorized by keyword fallback only.");
        println!("   Set OLLAMA_HOST (or OPENAI_COMPATIBLE_HOST with AI_BACKEND=openai_compatible)");
        println!("   to enable the model.");
        println!();
        return Ok(());
    };

    let status = client.status().await;
    println!("   Host:    {}", status.host);
    println!("   Model:   {}", status.model);
    if status.healthy {
        println!("   Status:  ✅ reachable");
    } else {
        println!("   Status:  ❌ not responding");
    }
    println!();
    Ok(())
}
