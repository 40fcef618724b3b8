//! Category resolution
//!
//! Keyword votes decide on their own when exactly one category matches.
//! Zero or several votes escalate to the classification service. When the
//! service is missing, fails, or answers with something that is not one of the
//! five labels, a fixed ladder picks among the votes instead.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::ai::{interpret_reply, AIClient, ClassificationService, ServiceReply};
use crate::error::Result;
use crate::keywords::{keyword_votes, normalize, EMPTY_DESCRIPTION, EMPTY_MERCHANT};
use crate::models::{Category, CategoryVotes};
use crate::prompts::{Prompt, PromptId, PromptLibrary};

/// Preference order used whenever the service cannot decide
pub const FALLBACK_ORDER: [Category; 5] = [
    Category::Food,
    Category::Transport,
    Category::Technology,
    Category::Entertainment,
    Category::Shopping,
];

/// Order categories are defined in the escalation prompt
const DEFINITION_ORDER: [Category; 5] = [
    Category::Food,
    Category::Transport,
    Category::Technology,
    Category::Shopping,
    Category::Entertainment,
];

/// First voted category in `FALLBACK_ORDER`, else `Unknown`
pub fn fallback_category(votes: &CategoryVotes) -> Category {
    FALLBACK_ORDER
        .iter()
        .copied()
        .find(|c| votes.contains(*c))
        .unwrap_or(Category::Unknown)
}

/// Why the fallback ladder was used
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No classification service configured
    Unconfigured,
    /// The call errored or timed out
    ServiceError(String),
    /// The service answered with nothing
    EmptyReply,
    /// The service answered with something other than a known label
    InvalidLabel(String),
}

/// How a category was decided
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Both inputs were empty
    Empty,
    /// Exactly one keyword vote
    Keyword,
    /// The classification service answered with a valid label
    Service,
    Fallback(FallbackReason),
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty input"),
            Self::Keyword => write!(f, "keyword match"),
            Self::Service => write!(f, "classification service"),
            Self::Fallback(FallbackReason::Unconfigured) => {
                write!(f, "keyword fallback (no classification service)")
            }
            Self::Fallback(FallbackReason::ServiceError(e)) => {
                write!(f, "keyword fallback (service error: {})", e)
            }
            Self::Fallback(FallbackReason::EmptyReply) => {
                write!(f, "keyword fallback (empty service reply)")
            }
            Self::Fallback(FallbackReason::InvalidLabel(label)) => {
                write!(f, "keyword fallback (invalid label '{}')", label)
            }
        }
    }
}

/// A resolved category together with how it was reached
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub category: Category,
    #[serde(flatten)]
    pub source: ResolutionSource,
    #[serde(serialize_with = "serialize_votes")]
    pub votes: CategoryVotes,
}

fn serialize_votes<S: serde::Serializer>(
    votes: &CategoryVotes,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(votes.iter())
}

/// Resolves a (description, merchant) pair to a category
pub struct CategoryResolver {
    ai: Option<AIClient>,
    prompt: Prompt,
}

impl CategoryResolver {
    /// Create a resolver, loading the escalation prompt from `prompts`
    pub fn new(ai: Option<AIClient>, prompts: &mut PromptLibrary) -> Result<Self> {
        let prompt = prompts.get(PromptId::ClassifyExpense)?.clone();
        Ok(Self { ai, prompt })
    }

    /// Create a resolver using only the embedded prompt
    pub fn embedded(ai: Option<AIClient>) -> Result<Self> {
        Self::new(ai, &mut PromptLibrary::embedded_only())
    }

    pub fn ai(&self) -> Option<&AIClient> {
        self.ai.as_ref()
    }

    /// Category for a description/merchant pair
    pub async fn predict_category(&self, description: &str, merchant: &str) -> Category {
        self.resolve(description, merchant).await.category
    }

    /// Category plus the path taken to reach it
    pub async fn resolve(&self, description: &str, merchant: &str) -> Resolution {
        let description = normalize(description);
        let merchant = normalize(merchant);

        if description.is_empty() && merchant.is_empty() {
            warn!("Empty description and merchant, category is unknown");
            return Resolution {
                category: Category::Unknown,
                source: ResolutionSource::Empty,
                votes: CategoryVotes::new(),
            };
        }

        let votes = keyword_votes(&description, &merchant);
        info!(
            description = %description,
            merchant = %merchant,
            votes = %votes.describe(),
            "Keyword matches"
        );

        if let Some(category) = votes.unanimous() {
            return Resolution {
                category,
                source: ResolutionSource::Keyword,
                votes,
            };
        }

        let Some(ref ai) = self.ai else {
            warn!("Classification service unavailable, using keyword fallback");
            return Self::fallback(votes, FallbackReason::Unconfigured);
        };

        let prompt = self.build_prompt(&description, &merchant, &votes);
        let reply = match ai.classify(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(
                    error = %e,
                    description = %description,
                    merchant = %merchant,
                    "Classification service call failed, using keyword fallback"
                );
                return Self::fallback(votes, FallbackReason::ServiceError(e.to_string()));
            }
        };

        match interpret_reply(&reply) {
            ServiceReply::Label(category) => {
                info!(category = %category, model = ai.model(), "Classified by service");
                Resolution {
                    category,
                    source: ResolutionSource::Service,
                    votes,
                }
            }
            ServiceReply::Empty => {
                warn!("Classification service returned no answer, using keyword fallback");
                Self::fallback(votes, FallbackReason::EmptyReply)
            }
            ServiceReply::Invalid(label) => {
                warn!(label = %label, "Invalid category from service, using keyword fallback");
                Self::fallback(votes, FallbackReason::InvalidLabel(label))
            }
        }
    }

    fn fallback(votes: CategoryVotes, reason: FallbackReason) -> Resolution {
        Resolution {
            category: fallback_category(&votes),
            source: ResolutionSource::Fallback(reason),
            votes,
        }
    }

    /// Render the escalation prompt for normalized inputs
    pub fn build_prompt(&self, description: &str, merchant: &str, votes: &CategoryVotes) -> String {
        let description = if description.is_empty() {
            EMPTY_DESCRIPTION
        } else {
            description
        };
        let merchant = if merchant.is_empty() {
            EMPTY_MERCHANT
        } else {
            merchant
        };
        let labels = Category::labels()
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let definitions = DEFINITION_ORDER
            .iter()
            .map(|c| format!("- {}: {}", c, c.definition()))
            .collect::<Vec<_>>()
            .join("\n");
        let candidates = votes.describe();

        let mut vars = HashMap::new();
        vars.insert("labels", labels.as_str());
        vars.insert("merchant", merchant);
        vars.insert("description", description);
        vars.insert("candidates", candidates.as_str());
        vars.insert("definitions", definitions.as_str());
        self.prompt.render_user(&vars)
    }
}
