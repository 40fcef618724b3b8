//! Receipt workflow commands (extract, scan)

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tillscan_core::{extract_fields, AppContext, ExtractedFields};

/// Read receipt text from a file, or stdin when the input is "-"
pub fn read_text_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
    }
}

pub fn cmd_extract(input: &str, json: bool) -> Result<()> {
    let text = read_text_input(input)?;
    let fields = extract_fields(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&fields)?);
    } else {
        print_fields(&fields);
    }
    Ok(())
}

pub async fn cmd_scan(ctx: &AppContext, image: &Path, save: bool, json: bool) -> Result<()> {
    let bytes =
        std::fs::read(image).with_context(|| format!("Failed to read {}", image.display()))?;

    let result = ctx.pipeline.classify_image(&bytes).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        println!("🧾 Receipt: {}", image.display());
        println!("   ─────────────────────────────────────────────");
        print_fields(&ExtractedFields {
            amount: result.expense.amount,
            merchant: result.expense.merchant.clone(),
            description: result.expense.description.clone(),
        });
        println!("   Category:    {}", result.expense.category);
        if result.raw_text.trim().is_empty() {
            println!();
            println!("   ⚠️  No text recognized (engine: {})", ctx.pipeline.ocr().name());
        }
    }

    if save {
        ctx.ledger
            .append(&result.expense)
            .context("Failed to save expense")?;
        if !json {
            println!();
            println!("✅ Saved to {}", ctx.ledger.path().display());
        }
    }

    Ok(())
}

fn print_fields(fields: &ExtractedFields) {
    println!("   Amount:      {:.2}", fields.amount);
    println!("   Merchant:    {}", fields.merchant);
    println!("   Description: {}", fields.description);
}
