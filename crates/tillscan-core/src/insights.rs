//! Spending summary and tips derived from the ledger

use std::collections::BTreeMap;

use crate::models::{Category, CategoryTotal, ClassifiedExpense, SpendingSummary};

/// Returned as the only tip when the ledger is empty
pub const EMPTY_LEDGER_TIP: &str = "No expenses recorded. Add some to get personalized tips.";

/// Share of spend above which one category gets a budget warning
const DOMINANT_SHARE: f64 = 0.5;

/// Per-category totals, largest first
pub fn summarize(expenses: &[ClassifiedExpense]) -> SpendingSummary {
    let mut totals: BTreeMap<Category, (f64, usize)> = BTreeMap::new();
    for expense in expenses {
        let entry = totals.entry(expense.category).or_insert((0.0, 0));
        entry.0 += expense.amount;
        entry.1 += 1;
    }

    let total: f64 = totals.values().map(|(t, _)| t).sum();
    let mut by_category: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, (cat_total, count))| CategoryTotal {
            category,
            total: cat_total,
            count,
            share: if total > 0.0 { cat_total / total } else { 0.0 },
        })
        .collect();

    // Stable sort keeps category order for equal totals
    by_category.sort_by(|a, b| b.total.total_cmp(&a.total));

    SpendingSummary {
        total,
        expense_count: expenses.len(),
        by_category,
    }
}

/// Plain-language tips for the ledger
pub fn recommendations(expenses: &[ClassifiedExpense]) -> Vec<String> {
    if expenses.is_empty() {
        return vec![EMPTY_LEDGER_TIP.to_string()];
    }

    let summary = summarize(expenses);
    let mut tips = vec![format!(
        "You have recorded {} expense{} totaling {:.2}.",
        summary.expense_count,
        plural(summary.expense_count),
        summary.total
    )];

    let top = summary
        .by_category
        .iter()
        .find(|c| c.category != Category::Unknown && c.total > 0.0);
    if let Some(top) = top {
        tips.push(format!(
            "Your largest spending category is {} at {:.0}% of the total ({:.2}).",
            top.category,
            top.share * 100.0,
            top.total
        ));
        if top.share > DOMINANT_SHARE {
            tips.push(format!(
                "More than half of your spending goes to {}. Consider setting a budget for it.",
                top.category
            ));
        }
    }

    let uncategorized = expenses
        .iter()
        .filter(|e| e.category == Category::Unknown)
        .count();
    if uncategorized > 0 {
        tips.push(format!(
            "{} expense{} could not be categorized. Review them to keep these tips accurate.",
            uncategorized,
            plural(uncategorized)
        ));
    }

    let missing_amount = expenses.iter().filter(|e| e.amount == 0.0).count();
    if missing_amount > 0 {
        tips.push(format!(
            "{} expense{} had no amount detected. Edit them for accurate totals.",
            missing_amount,
            plural(missing_amount)
        ));
    }

    tips
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
