//! Server command implementation

use anyhow::Result;
use tillscan_core::Config;

use super::open_context;

pub async fn cmd_serve(config: Config) -> Result<()> {
    println!("🚀 Starting Tillscan web server...");
    println!("   Ledger: {}", config.ledger.path.display());
    println!(
        "   Listening: http://{}:{}",
        config.server.host, config.server.port
    );
    if let Some(ref dir) = config.server.static_dir {
        println!("   Static files: {}", dir.display());
    }

    if config.server.api_keys.is_empty() {
        println!();
        println!("   ⚠️  Authentication DISABLED - set TILLSCAN_API_KEYS before exposing to a network");
    } else {
        println!(
            "   🔑 API key authentication ({} key(s))",
            config.server.api_keys.len()
        );
    }
    println!();

    let ctx = open_context(config)?;
    tillscan_server::serve(ctx).await
}
