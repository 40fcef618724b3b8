//! Receipt field extraction
//!
//! Turns noisy OCR text into an amount, a merchant and a short description.
//! Extraction never fails: anything that cannot be found falls back to a
//! sentinel so downstream classification always receives non-empty strings.
//!
//! Amount precedence:
//! 1. A number following one of the anchors `Total`, `Amount`, `Due`, `Price`,
//!    `Bill` or `Rs` (case-insensitive, optional `$`/`₹`)
//! 2. The first bare number that is not next to a time marker
//!    (`hours`, `am`, `pm`, `time`)
//! 3. `0.0`
//!
//! The merchant is the first line containing a letter and the description is
//! built from the two lines after it. Lines that open with a labeled amount
//! (`Total $45.50`) are never merchant or description candidates; an anchor
//! buried inside a word (`Diners 24/7`, `Burgers 2`) does not count.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::models::{
    ExtractedFields, DESCRIPTION_MAX_CHARS, MERCHANT_MAX_CHARS, UNRECOGNIZED_ITEM,
    UNRECOGNIZED_MERCHANT,
};

/// Characters inspected on each side of a bare number for time markers
const TIME_WINDOW: usize = 5;

/// Markers that make a nearby number look like a timestamp
const TIME_TOKENS: &[&str] = &["hours", "am", "pm", "time"];

/// Lines after the merchant that may form the description
const DESCRIPTION_LINES: usize = 2;

fn labeled_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:Total|Amount|Due|Price|Bill|Rs)\s*[$₹]?(\d{1,5}(?:[,.]\d{0,3})?)")
            .expect("valid regex")
    })
}

/// A line that starts with an amount anchor followed by a number
fn labeled_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:Total|Amount|Due|Price|Bill|Rs)\s*[$₹]?\d").expect("valid regex")
    })
}

fn bare_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{1,5}(?:[,.]\d{0,3})?").expect("valid regex"))
}

/// Extract amount, merchant and description from raw receipt text
pub fn extract_fields(text: &str) -> ExtractedFields {
    let amount = extract_amount(text);
    let (merchant, description) = extract_merchant_and_description(text);

    debug!(amount, merchant = %merchant, description = %description, "Extracted receipt fields");

    ExtractedFields {
        amount,
        merchant,
        description,
    }
}

/// Find the receipt amount, falling back to 0.0
pub fn extract_amount(text: &str) -> f64 {
    if let Some(amount) = labeled_amount(text) {
        return amount;
    }
    unlabeled_amount(text).unwrap_or(0.0)
}

fn labeled_amount(text: &str) -> Option<f64> {
    labeled_amount_re()
        .captures_iter(text)
        .find_map(|caps| caps.get(1).and_then(|m| parse_number(m.as_str())))
}

/// Scan bare numbers, skipping anything that sits next to a time marker.
///
/// Every surviving candidate scores the same, so the first one in reading
/// order is taken.
fn unlabeled_amount(text: &str) -> Option<f64> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let time_mask = time_token_mask(&chars);

    bare_number_re()
        .find_iter(text)
        .filter(|m| {
            let start = chars.partition_point(|(b, _)| *b < m.start());
            let end = chars.partition_point(|(b, _)| *b < m.end());
            let window_start = start.saturating_sub(TIME_WINDOW);
            let window_end = (end + TIME_WINDOW).min(chars.len());
            !time_mask[window_start..window_end].iter().any(|&t| t)
        })
        .find_map(|m| parse_number(m.as_str()))
}

/// Mark every character that belongs to a time marker occurrence
fn time_token_mask(chars: &[(usize, char)]) -> Vec<bool> {
    let lowered: Vec<char> = chars.iter().map(|(_, c)| c.to_ascii_lowercase()).collect();
    let mut mask = vec![false; lowered.len()];

    for token in TIME_TOKENS {
        let token: Vec<char> = token.chars().collect();
        if token.len() > lowered.len() {
            continue;
        }
        for i in 0..=lowered.len() - token.len() {
            if lowered[i..i + token.len()] == token[..] {
                mask[i..i + token.len()].iter_mut().for_each(|m| *m = true);
            }
        }
    }

    mask
}

/// Parse a matched number; commas are treated as thousands separators
fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim_end_matches('.');
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn extract_merchant_and_description(text: &str) -> (String, String) {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && has_letter(line))
        .filter(|line| !labeled_line_re().is_match(line))
        .collect();

    let merchant = lines
        .first()
        .map(|line| truncate_chars(line, MERCHANT_MAX_CHARS))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| UNRECOGNIZED_MERCHANT.to_string());

    let description = lines
        .iter()
        .skip(1)
        .take(DESCRIPTION_LINES)
        .filter(|line| line.chars().count() > 3)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    let description = truncate_chars(&description, DESCRIPTION_MAX_CHARS);
    let description = if description.trim().is_empty() {
        UNRECOGNIZED_ITEM.to_string()
    } else {
        description
    };

    (merchant, description)
}

fn has_letter(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_alphabetic())
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labeled_total_with_currency() {
        let fields = extract_fields("Total $45.50\nCoffee Shop\nLatte and muffin");
        assert!((fields.amount - 45.50).abs() < f64::EPSILON);
        assert_eq!(fields.merchant, "Coffee Shop");
        assert!(fields.description.contains("Latte and muffin"));
    }

    #[test]
    fn test_anchor_inside_word_keeps_line() {
        let fields = extract_fields("Joe's Diners 24/7\nChicken meal\nTotal 9.00");
        assert_eq!(fields.merchant, "Joe's Diners 24/7");
        assert_eq!(fields.description, "Chicken meal");

        let fields = extract_fields("City Mall\nBurgers 2 x 4.50\nFries combo");
        assert_eq!(fields.merchant, "City Mall");
        assert_eq!(fields.description, "Burgers 2 x 4.50 Fries combo");
    }

    #[test]
    fn test_labeled_line_filter() {
        assert!(labeled_line_re().is_match("Total $45.50"));
        assert!(labeled_line_re().is_match("  rs₹120"));
        assert!(labeled_line_re().is_match("AMOUNT 12"));
        assert!(!labeled_line_re().is_match("Joe's Diners 24/7"));
        assert!(!labeled_line_re().is_match("Burgers 2 x 4.50"));
        assert!(!labeled_line_re().is_match("Fondue 3"));
        assert!(!labeled_line_re().is_match("Grand Total 9.00"));
    }

    #[test]
    fn test_merchant_first_lettered_line() {
        let fields = extract_fields("12.00\nCoffee Shop\nLatte and muffin\nTotal 12.00");
        assert_eq!(fields.merchant, "Coffee Shop");
        assert_eq!(fields.description, "Latte and muffin");
        assert!((fields.amount - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_first_labeled_match_wins() {
        let fields = extract_fields("Price 3.50\nTOTAL 7.00");
        assert!((fields.amount - 3.50).abs() < f64::EPSILON);
    }

    #[test]
    fn test_labeled_anchor_is_case_insensitive() {
        assert!((extract_amount("amount due: nope\nBILL 88") - 88.0).abs() < f64::EPSILON);
        assert!((extract_amount("rs 250") - 250.0).abs() < f64::EPSILON);
        assert!((extract_amount("Rs₹120.5") - 120.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_thousands_separator_stripped() {
        assert!((extract_amount("Total 1,250") - 1250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_trailing_separator_parses() {
        assert!((extract_amount("Total 45.") - 45.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unlabeled_skips_time() {
        let fields = extract_fields("3:00 pm\nNo total shown\nItem");
        assert_eq!(fields.amount, 0.0);
    }

    #[test]
    fn test_unlabeled_takes_first_non_time_number() {
        let text = "Open 9 hours daily\nSnack bar\nChips 2.75";
        assert!((extract_amount(text) - 2.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unlabeled_first_candidate_wins() {
        assert!((extract_amount("Cafe\nLatte 4.20\nMuffin 3.10") - 4.20).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_numbers_defaults_to_zero() {
        assert_eq!(extract_amount("Thank you for visiting"), 0.0);
        assert_eq!(extract_amount(""), 0.0);
    }

    #[test]
    fn test_sentinels_for_empty_text() {
        let fields = extract_fields("");
        assert_eq!(fields.amount, 0.0);
        assert_eq!(fields.merchant, UNRECOGNIZED_MERCHANT);
        assert_eq!(fields.description, UNRECOGNIZED_ITEM);
    }

    #[test]
    fn test_amount_line_is_not_merchant() {
        let fields = extract_fields("TOTAL 18.00\nAMOUNT DUE 18.00");
        assert_eq!(fields.merchant, UNRECOGNIZED_MERCHANT);
        assert_eq!(fields.description, UNRECOGNIZED_ITEM);
        assert!((fields.amount - 18.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sentinels_for_numeric_only_text() {
        let fields = extract_fields("1234\n\n  56.78  \n---");
        assert_eq!(fields.merchant, UNRECOGNIZED_MERCHANT);
        assert_eq!(fields.description, UNRECOGNIZED_ITEM);
        assert!((fields.amount - 1234.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_short_description_lines_dropped() {
        let fields = extract_fields("Corner Deli\nTea\nEgg\n");
        assert_eq!(fields.merchant, "Corner Deli");
        assert_eq!(fields.description, UNRECOGNIZED_ITEM);
    }

    #[test]
    fn test_description_uses_only_next_two_lines() {
        let fields = extract_fields("Shop\nFirst item\nSecond item\nThird item");
        assert_eq!(fields.description, "First item Second item");
    }

    #[test]
    fn test_merchant_and_description_truncated() {
        let long_merchant = "M".repeat(80);
        let long_line = "d".repeat(70);
        let text = format!("{}\n{}\n{}", long_merchant, long_line, long_line);
        let fields = extract_fields(&text);
        assert_eq!(fields.merchant.chars().count(), MERCHANT_MAX_CHARS);
        assert_eq!(fields.description.chars().count(), DESCRIPTION_MAX_CHARS);
    }

    #[test]
    fn test_truncation_respects_multibyte_chars() {
        let text = format!("{}\nitem line", "Café ".repeat(20));
        let fields = extract_fields(&text);
        assert_eq!(fields.merchant.chars().count(), MERCHANT_MAX_CHARS);
    }

    #[test]
    fn test_crlf_lines_are_trimmed() {
        let fields = extract_fields("Downtown Cafe\r\nCoffee and pastry\r\nTotal 9.00\r\n");
        assert_eq!(fields.merchant, "Downtown Cafe");
        assert_eq!(fields.description, "Coffee and pastry");
    }

    #[test]
    fn test_invariants_hold_for_garbage() {
        let samples = [
            "",
            "\n\n\n",
            "%%%%",
            "am pm 12 34",
            "₹₹₹ 99999.999 Total",
            "x",
            "Total $",
            "ïïï\n©©©\n1,,2",
        ];
        for sample in samples {
            let fields = extract_fields(sample);
            assert!(fields.amount >= 0.0, "amount for {:?}", sample);
            let m = fields.merchant.chars().count();
            let d = fields.description.chars().count();
            assert!((1..=MERCHANT_MAX_CHARS).contains(&m), "merchant for {:?}", sample);
            assert!((1..=DESCRIPTION_MAX_CHARS).contains(&d), "description for {:?}", sample);
        }
    }
}
