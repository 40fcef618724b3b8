//! Interpretation of classification service replies
//!
//! Models are asked for a bare label. Anything beyond trimming and
//! lower-casing is treated as an invalid reply rather than guessed at.

use crate::models::Category;

use super::types::ServiceReply;

/// Longest invalid reply kept for log messages
const MAX_LOGGED_REPLY: usize = 60;

/// Classify a raw reply as a label, empty, or invalid
pub fn interpret_reply(raw: &str) -> ServiceReply {
    let cleaned = raw.trim().to_lowercase();
    if cleaned.is_empty() {
        return ServiceReply::Empty;
    }

    match Category::from_label(&cleaned) {
        Some(category) => ServiceReply::Label(category),
        None => ServiceReply::Invalid(truncate_for_log(&cleaned)),
    }
}

fn truncate_for_log(s: &str) -> String {
    if s.chars().count() > MAX_LOGGED_REPLY {
        format!("{}...", s.chars().take(MAX_LOGGED_REPLY).collect::<String>())
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_label_any_case() {
        assert_eq!(
            interpret_reply("  Transport\n"),
            ServiceReply::Label(Category::Transport)
        );
        assert_eq!(
            interpret_reply("ENTERTAINMENT"),
            ServiceReply::Label(Category::Entertainment)
        );
    }

    #[test]
    fn test_empty_reply() {
        assert_eq!(interpret_reply(""), ServiceReply::Empty);
        assert_eq!(interpret_reply(" \n\t"), ServiceReply::Empty);
    }

    #[test]
    fn test_invalid_reply() {
        assert_eq!(
            interpret_reply("Groceries"),
            ServiceReply::Invalid("groceries".into())
        );
        assert_eq!(
            interpret_reply("unknown"),
            ServiceReply::Invalid("unknown".into())
        );
        assert_eq!(
            interpret_reply("Category: food"),
            ServiceReply::Invalid("category: food".into())
        );
    }

    #[test]
    fn test_long_invalid_reply_is_truncated() {
        let reply = "x".repeat(500);
        match interpret_reply(&reply) {
            ServiceReply::Invalid(text) => assert!(text.len() < 100),
            other => panic!("expected invalid, got {:?}", other),
        }
    }
}
