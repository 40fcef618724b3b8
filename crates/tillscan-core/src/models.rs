//! Domain models for Tillscan

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Placeholder merchant when no line of the receipt looks like a name
pub const UNRECOGNIZED_MERCHANT: &str = "Unrecognized Merchant";

/// Placeholder description when the receipt has no usable item lines
pub const UNRECOGNIZED_ITEM: &str = "Unrecognized Item";

/// Maximum merchant length in characters
pub const MERCHANT_MAX_CHARS: usize = 50;

/// Maximum description length in characters
pub const DESCRIPTION_MAX_CHARS: usize = 100;

/// Spending category
///
/// The five real labels form a closed set; `Unknown` is the sentinel used when
/// neither keywords nor the classification service can decide.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Transport,
    Technology,
    Shopping,
    Entertainment,
    #[default]
    Unknown,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Transport => "transport",
            Self::Technology => "technology",
            Self::Shopping => "shopping",
            Self::Entertainment => "entertainment",
            Self::Unknown => "unknown",
        }
    }

    /// The five labels a classifier may answer with (excludes `Unknown`)
    pub fn labels() -> &'static [Category] {
        &[
            Self::Food,
            Self::Transport,
            Self::Shopping,
            Self::Entertainment,
            Self::Technology,
        ]
    }

    /// One-line definition used in the classification prompt
    pub fn definition(&self) -> &'static str {
        match self {
            Self::Food => "dining, groceries, snacks (e.g., coffee, meal, restaurant)",
            Self::Transport => "travel, fuel, vehicles (e.g., fuel, taxi, uber)",
            Self::Technology => "gadgets, electronics (e.g., laptop, amazon)",
            Self::Shopping => "retail, general purchases (e.g., groceries, clothing, walmart)",
            Self::Entertainment => "events, media (e.g., movie, ticket, cineplex)",
            Self::Unknown => "could not be determined",
        }
    }

    /// Parse a label produced by a classifier.
    ///
    /// Only the five real labels are accepted; `unknown` and anything else is
    /// rejected so a model can never smuggle the sentinel or free text through.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "food" => Some(Self::Food),
            "transport" => Some(Self::Transport),
            "technology" => Some(Self::Technology),
            "shopping" => Some(Self::Shopping),
            "entertainment" => Some(Self::Entertainment),
            _ => None,
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unknown" => Ok(Self::Unknown),
            other => Self::from_label(other).ok_or_else(|| format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fields pulled out of raw receipt text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub amount: f64,
    pub merchant: String,
    pub description: String,
}

/// Categories flagged as plausible by keyword matching
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryVotes(BTreeSet<Category>);

impl CategoryVotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: Category) {
        self.0.insert(category);
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains(&category)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The single vote, if and only if there is exactly one
    pub fn unanimous(&self) -> Option<Category> {
        if self.0.len() == 1 {
            self.0.iter().next().copied()
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.iter().copied()
    }

    /// Comma-separated labels, or "none"
    pub fn describe(&self) -> String {
        if self.0.is_empty() {
            "none".to_string()
        } else {
            self.0
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

impl FromIterator<Category> for CategoryVotes {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A categorized expense, as stored in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedExpense {
    pub amount: f64,
    pub merchant: String,
    pub description: String,
    pub category: Category,
}

impl ClassifiedExpense {
    pub fn from_fields(fields: ExtractedFields, category: Category) -> Self {
        Self {
            amount: fields.amount,
            merchant: fields.merchant,
            description: fields.description,
            category,
        }
    }
}

/// Result of running a receipt image through the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageClassification {
    #[serde(flatten)]
    pub expense: ClassifiedExpense,
    /// OCR text the fields were extracted from
    pub raw_text: String,
}

/// Spend for one category in the summary report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
    pub count: usize,
    /// Share of overall spend, 0.0 to 1.0
    pub share: f64,
}

/// Ledger-wide spending summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendingSummary {
    pub total: f64,
    pub expense_count: usize,
    /// Categories ordered by total, largest first
    pub by_category: Vec<CategoryTotal>,
}
