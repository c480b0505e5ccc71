//! Indian UIDAI person identification numbers

use crate::pattern::{Pattern, PatternRecognizer, PatternRecognizerBuilder, PatternValidator};
use crate::validators::{is_palindrome, sanitize_value, verhoeff};

pub const NAME: &str = "InAadhaarRecognizer";
pub const ENTITY: &str = "IN_AADHAAR";

pub struct AadhaarValidator;

impl PatternValidator for AadhaarValidator {
    fn validate_result(&self, pattern_text: &str) -> Option<bool> {
        let sanitized = sanitize_value(pattern_text, &[("-", ""), (" ", ""), (":", "")]);
        let valid = sanitized.len() == 12
            && sanitized.chars().all(|c| c.is_ascii_digit())
            && sanitized.as_bytes()[0] >= b'2'
            && verhoeff(&sanitized)
            && !is_palindrome(&sanitized);
        Some(valid)
    }
}

pub fn builder() -> PatternRecognizerBuilder {
    PatternRecognizer::builder(ENTITY)
        .name(NAME)
        .pattern(Pattern::new("AADHAAR (Very Weak)", r"\b[0-9]{12}\b", 0.01))
        .context(["aadhaar", "uidai"])
        .validator(AadhaarValidator)
}
