//! US social security numbers

use crate::pattern::{Pattern, PatternRecognizer, PatternRecognizerBuilder, PatternValidator};
use crate::validators::all_same_char;
use std::collections::HashSet;

pub const NAME: &str = "UsSsnRecognizer";
pub const ENTITY: &str = "US_SSN";

const CONTEXT: &[&str] = &["social", "security", "ssn", "ssns", "ssn#", "ss#", "ssid"];

const INVALID_PREFIXES: &[&str] = &["000", "666", "123456789", "98765432", "078051120"];

pub struct UsSsnValidator;

impl PatternValidator for UsSsnValidator {
    fn invalidate_result(&self, pattern_text: &str) -> Option<bool> {
        let delimiters: HashSet<char> = pattern_text
            .chars()
            .filter(|c| matches!(c, '.' | '-' | ' '))
            .collect();
        if delimiters.len() > 1 {
            return Some(true);
        }

        let only_digits: String = pattern_text.chars().filter(char::is_ascii_digit).collect();
        if only_digits.len() != 9 || all_same_char(&only_digits) {
            return Some(true);
        }
        if &only_digits[3..5] == "00" || &only_digits[5..] == "0000" {
            return Some(true);
        }
        if INVALID_PREFIXES.iter().any(|p| only_digits.starts_with(p)) {
            return Some(true);
        }

        Some(false)
    }
}

pub fn builder() -> PatternRecognizerBuilder {
    PatternRecognizer::builder(ENTITY)
        .name(NAME)
        .patterns([
            Pattern::new("SSN1 (very weak)", r"\b([0-9]{5})-([0-9]{4})\b", 0.05),
            Pattern::new("SSN2 (very weak)", r"\b([0-9]{3})-([0-9]{6})\b", 0.05),
            Pattern::new(
                "SSN3 (very weak)",
                r"\b(([0-9]{3})-([0-9]{2})-([0-9]{4}))\b",
                0.05,
            ),
            Pattern::new("SSN4 (very weak)", r"\b[0-9]{9}\b", 0.05),
            Pattern::new(
                "SSN5 (medium)",
                r"\b([0-9]{3})[- .]([0-9]{2})[- .]([0-9]{4})\b",
                0.5,
            ),
        ])
        .context(CONTEXT.iter().copied())
        .validator(UsSsnValidator)
}
