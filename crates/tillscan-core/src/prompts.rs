//! Prompt library for the classification service
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for an override in the data dir (~/.local/share/tillscan/prompts/overrides/)
//! 2. Fall back to the embedded default (compiled into the binary)
//!
//! Overrides let users tune wording for their model without rebuilding.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const CLASSIFY_EXPENSE: &str = include_str!("../../../prompts/classify_expense.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Escalation prompt used when keyword votes are ambiguous
    ClassifyExpense,
}

impl PromptId {
    /// Get the string identifier for this prompt
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClassifyExpense => "classify_expense",
        }
    }

    /// Get all known prompt IDs
    pub fn all() -> &'static [PromptId] {
        &[Self::ClassifyExpense]
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::ClassifyExpense => defaults::CLASSIFY_EXPENSE,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    pub version: u32,
    pub task_type: String,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// The prompt body below the frontmatter
    pub content: String,
    /// Path of the override file, when one was used
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    pub fn is_override(&self) -> bool {
        self.override_path.is_some()
    }

    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render the user section, or the whole body if it has none
    pub fn render_user(&self, vars: &HashMap<&str, &str>) -> String {
        render_template(self.user_section().unwrap_or(&self.content), vars)
    }
}

/// Prompt library for loading and caching prompts
#[derive(Debug)]
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a prompt library with the default override directory
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with a custom override directory
    pub fn with_override_dir(path: impl Into<PathBuf>) -> Self {
        Self {
            override_dir: Some(path.into()),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    /// Get a prompt by ID, loading from override or default
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if !self.cache.contains_key(&id) {
            let prompt = self.load(id)?;
            self.cache.insert(id, prompt);
        }
        self.cache
            .get(&id)
            .ok_or_else(|| Error::InvalidData(format!("Prompt {} not cached", id.as_str())))
    }

    fn load(&self, id: PromptId) -> Result<Prompt> {
        if let Some(path) = self.override_path(id).filter(|p| p.exists()) {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::InvalidData(format!("Failed to read prompt override: {}", e))
            })?;
            let (metadata, body) = parse_prompt(&content)?;
            debug!(prompt = id.as_str(), path = %path.display(), "Using prompt override");
            return Ok(Prompt {
                metadata,
                content: body,
                override_path: Some(path),
            });
        }

        let (metadata, body) = parse_prompt(id.default_content())?;
        Ok(Prompt {
            metadata,
            content: body,
            override_path: None,
        })
    }

    fn override_path(&self, id: PromptId) -> Option<PathBuf> {
        self.override_dir
            .as_ref()
            .map(|d| d.join(format!("{}.md", id.as_str())))
    }

    pub fn override_dir(&self) -> Option<&Path> {
        self.override_dir.as_deref()
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tillscan").join("prompts").join("overrides"))
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    let rest = content.strip_prefix("---").ok_or_else(|| {
        Error::InvalidData("Prompt must start with YAML frontmatter (---)".into())
    })?;

    let end = rest.find("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

/// Extract a section from the prompt content
fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];
    let end = after_header.find("\n# ").unwrap_or(after_header.len());
    Some(after_header[..end].trim())
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid regex"))
}

/// Replace `{{var}}` placeholders in one pass over the template.
///
/// Substituted values are never rescanned, and unknown placeholders are left
/// as written.
fn render_template(template: &str, vars: &HashMap<&str, &str>) -> String {
    placeholder_re()
        .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => (*value).to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prompt() {
        let content = r#"---
id: test_prompt
version: 1
task_type: fast_classification
---

# User
Test user prompt with {{variable}}.
"#;

        let (metadata, body) = parse_prompt(content).unwrap();
        assert_eq!(metadata.id, "test_prompt");
        assert_eq!(metadata.version, 1);
        assert_eq!(metadata.task_type, "fast_classification");
        assert!(body.starts_with("# User"));
    }

    #[test]
    fn test_parse_prompt_requires_frontmatter() {
        assert!(parse_prompt("# User\nhello").is_err());
        assert!(parse_prompt("---\nid: x\n# User\nhello").is_err());
    }

    #[test]
    fn test_extract_section() {
        let content = "# User\nUser content here.\n\n# Notes\nNot sent.";
        assert_eq!(
            extract_section(content, "# User"),
            Some("User content here.")
        );
        assert_eq!(extract_section(content, "# Missing"), None);
    }

    #[test]
    fn test_substituted_values_are_not_expanded() {
        let mut vars = HashMap::new();
        vars.insert("merchant", "acme");
        vars.insert("description", "refund for {{merchant}} order");
        let rendered = render_template("M: {{merchant}} D: {{description}}", &vars);
        assert_eq!(rendered, "M: acme D: refund for {{merchant}} order");
    }

    #[test]
    fn test_unknown_placeholders_left_alone() {
        let mut vars = HashMap::new();
        vars.insert("merchant", "acme");
        let rendered = render_template("{{merchant}} {{missing}} {{ spaced }}", &vars);
        assert_eq!(rendered, "acme {{missing}} {{ spaced }}");
    }

    #[test]
    fn test_embedded_prompts_parse() {
        let mut lib = PromptLibrary::embedded_only();
        for id in PromptId::all() {
            let prompt = lib.get(*id).unwrap();
            assert_eq!(prompt.metadata.id, id.as_str());
            assert!(!prompt.is_override());
            assert!(prompt.user_section().is_some());
        }
    }

    #[test]
    fn test_classify_expense_renders_user_section() {
        let mut lib = PromptLibrary::embedded_only();
        let prompt = lib.get(PromptId::ClassifyExpense).unwrap();

        let mut vars = HashMap::new();
        vars.insert("merchant", "corner store");
        vars.insert("description", "gadget and gift");
        vars.insert("candidates", "technology, shopping");
        vars.insert("labels", "food, transport");
        vars.insert("definitions", "- food: dining");

        let rendered = prompt.render_user(&vars);
        assert!(rendered.contains("Merchant: corner store"));
        assert!(rendered.contains("Description: gadget and gift"));
        assert!(rendered.contains("based on keywords: technology, shopping."));
        assert!(rendered.contains("Return ONLY the category name."));
        assert!(!rendered.contains("# User"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn test_override_dir_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("classify_expense.md"),
            "---\nid: classify_expense\nversion: 7\ntask_type: custom\n---\n# User\nLabel {{merchant}}",
        )
        .unwrap();

        let mut lib = PromptLibrary::with_override_dir(dir.path());
        let prompt = lib.get(PromptId::ClassifyExpense).unwrap();
        assert!(prompt.is_override());
        assert_eq!(prompt.metadata.version, 7);

        let mut vars = HashMap::new();
        vars.insert("merchant", "acme");
        assert_eq!(prompt.render_user(&vars), "Label acme");
    }

    #[test]
    fn test_override_without_user_header_renders_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("classify_expense.md"),
            "---\nid: classify_expense\nversion: 2\ntask_type: custom\n---\nPick one of {{labels}}",
        )
        .unwrap();

        let mut lib = PromptLibrary::with_override_dir(dir.path());
        let prompt = lib.get(PromptId::ClassifyExpense).unwrap();

        let mut vars = HashMap::new();
        vars.insert("labels", "food, transport");
        assert_eq!(prompt.render_user(&vars), "Pick one of food, transport");
    }

    #[test]
    fn test_missing_override_falls_back_to_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let mut lib = PromptLibrary::with_override_dir(dir.path());
        let prompt = lib.get(PromptId::ClassifyExpense).unwrap();
        assert!(!prompt.is_override());
        assert_eq!(prompt.metadata.version, 1);
    }
}
