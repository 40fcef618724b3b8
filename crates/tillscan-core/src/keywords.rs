//! Keyword voting for expense categories
//!
//! Each category carries two substring lists: one tested against the item
//! description and one against the merchant name. A category gets a vote when
//! either list matches. There is no ranking; callers decide what to do with
//! zero or several votes.

use crate::models::{Category, CategoryVotes};

/// Stand-in description when the caller supplies none
pub const EMPTY_DESCRIPTION: &str = "not specified";

/// Stand-in merchant when the caller supplies none
pub const EMPTY_MERCHANT: &str = "unknown merchant";

/// Keyword lists for one category
#[derive(Debug)]
pub struct KeywordRule {
    pub category: Category,
    pub description_keywords: &'static [&'static str],
    pub merchant_keywords: &'static [&'static str],
}

impl KeywordRule {
    fn matches(&self, description: &str, merchant: &str) -> bool {
        self.description_keywords
            .iter()
            .any(|k| description.contains(k))
            || self.merchant_keywords.iter().any(|k| merchant.contains(k))
    }
}

/// Static keyword tables
pub const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        category: Category::Food,
        description_keywords: &[
            "tea", "coffee", "latte", "chicken", "food", "egg", "burger", "pizza", "meal",
            "snack", "dinner", "dosha", "roast", "shawarma", "sugar",
        ],
        merchant_keywords: &["cafe", "restaurant", "bakery", "diner", "kitchen", "teashop"],
    },
    KeywordRule {
        category: Category::Transport,
        description_keywords: &[
            "petrol", "fuel", "parking", "taxi", "bus", "train", "vehicle", "car", "bike",
            "travel", "ride",
        ],
        merchant_keywords: &["fuel", "gas", "parking", "station", "transport", "shell"],
    },
    KeywordRule {
        category: Category::Technology,
        description_keywords: &[
            "gadget", "mobile", "laptop", "phone", "tablet", "computer", "software", "speaker",
        ],
        merchant_keywords: &["best buy", "amazon", "tech", "electronics"],
    },
    KeywordRule {
        category: Category::Shopping,
        description_keywords: &[
            "groceries",
            "clothing",
            "shoes",
            "gift",
            "accessories",
            "retail",
        ],
        merchant_keywords: &["market", "store", "mall", "hypermarket", "walmart"],
    },
    KeywordRule {
        category: Category::Entertainment,
        description_keywords: &["movie", "concert", "game", "event", "ticket"],
        merchant_keywords: &["cinema", "theater", "cineplex"],
    },
];

/// Lower-case and trim a caller-supplied string
pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Vote on categories for a description/merchant pair.
///
/// Inputs are normalized here as well, so raw strings are accepted. Empty
/// inputs are replaced with neutral stand-ins before matching.
pub fn keyword_votes(description: &str, merchant: &str) -> CategoryVotes {
    let description = normalize(description);
    let merchant = normalize(merchant);
    let description = if description.is_empty() {
        EMPTY_DESCRIPTION
    } else {
        description.as_str()
    };
    let merchant = if merchant.is_empty() {
        EMPTY_MERCHANT
    } else {
        merchant.as_str()
    };

    KEYWORD_RULES
        .iter()
        .filter(|rule| rule.matches(description, merchant))
        .map(|rule| rule.category)
        .collect()
}
