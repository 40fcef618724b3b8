//! Ledger commands (list, add, summary)

use anyhow::{anyhow, Context, Result};
use tillscan_core::{
    recommendations, summarize, AppContext, Category, ClassifiedExpense, ExpenseLedger,
};

use super::truncate;

pub fn cmd_expenses_list(ledger: &ExpenseLedger) -> Result<()> {
    let expenses = ledger.read_all().context("Failed to read ledger")?;

    if expenses.is_empty() {
        println!("No expenses recorded in {}", ledger.path().display());
        println!("Add one with: tillscan expenses add -a 12.50 -m \"Cafe\" -d \"coffee\"");
        return Ok(());
    }

    println!(
        "{:>10}  {:<24}  {:<32}  {}",
        "AMOUNT", "MERCHANT", "DESCRIPTION", "CATEGORY"
    );
    for expense in &expenses {
        println!(
            "{:>10.2}  {:<24}  {:<32}  {}",
            expense.amount,
            truncate(&expense.merchant, 24),
            truncate(&expense.description, 32),
            expense.category
        );
    }
    println!();
    println!("{} expense(s)", expenses.len());
    Ok(())
}

/// Record an expense, categorizing it when no category is given
pub async fn cmd_expenses_add(
    ctx: &AppContext,
    amount: f64,
    merchant: &str,
    description: &str,
    category: Option<&str>,
) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(anyhow!("Amount must be a non-negative number"));
    }

    let category = match category {
        Some(label) => label.parse::<Category>().map_err(|e| anyhow!(e))?,
        None => ctx.resolver().predict_category(description, merchant).await,
    };

    let expense = ClassifiedExpense {
        amount,
        merchant: merchant.to_string(),
        description: description.to_string(),
        category,
    };
    ctx.ledger
        .append(&expense)
        .context("Failed to save expense")?;

    println!(
        "✅ Recorded {:.2} at {} as {}",
        expense.amount, expense.merchant, expense.category
    );
    Ok(())
}

pub fn cmd_summary(ledger: &ExpenseLedger) -> Result<()> {
    let expenses = ledger.read_all().context("Failed to read ledger")?;
    let summary = summarize(&expenses);

    println!();
    println!("💰 Spending Summary");
    println!("   ─────────────────────────────────────────────");
    for row in &summary.by_category {
        println!(
            "   {:<14} {:>10.2}  {:>5.1}%  ({} expense(s))",
            row.category.as_str(),
            row.total,
            row.share * 100.0,
            row.count
        );
    }
    println!("   {:<14} {:>10.2}", "total", summary.total);

    println!();
    println!("💡 Tips");
    for tip in recommendations(&expenses) {
        println!("   - {}", tip);
    }
    println!();
    Ok(())
}
