//! German tax identification numbers (Steuer-ID)

use crate::pattern::{Pattern, PatternRecognizer, PatternRecognizerBuilder, PatternValidator};
use crate::validators::{iso7064_mod_11_10, sanitize_value};

pub const NAME: &str = "DeTaxIdRecognizer";
pub const ENTITY: &str = "DE_TAX_ID";

const CONTEXT: &[&str] = &[
    "steueridentifikationsnummer",
    "steuer-id",
    "steuerid",
    "steuer-identifikationsnummer",
    "tax id",
    "tax identification number",
    "idnr",
    "id-nr",
    "tin",
    "steuernummer",
];

pub struct DeTaxIdValidator;

impl DeTaxIdValidator {
    /// One digit appears two or three times and at least one digit is absent
    fn valid_digit_distribution(digits: &str) -> bool {
        let mut counts = [0u8; 10];
        for b in digits.bytes() {
            counts[(b - b'0') as usize] += 1;
        }
        counts.contains(&0) && counts.iter().any(|&c| c == 2 || c == 3)
    }
}

impl PatternValidator for DeTaxIdValidator {
    fn validate_result(&self, pattern_text: &str) -> Option<bool> {
        let sanitized = sanitize_value(pattern_text, &[("-", ""), (" ", ""), ("/", "")]);
        let valid = sanitized.len() == 11
            && sanitized.chars().all(|c| c.is_ascii_digit())
            && !sanitized.starts_with('0')
            && Self::valid_digit_distribution(&sanitized[..10])
            && iso7064_mod_11_10(&sanitized);
        Some(valid)
    }
}

pub fn builder() -> PatternRecognizerBuilder {
    PatternRecognizer::builder(ENTITY)
        .name(NAME)
        .language("de")
        .patterns([
            Pattern::new(
                "Tax ID (with separators)",
                r"\b[1-9][0-9]{2}[\s/-]?[0-9]{3}[\s/-]?[0-9]{3}[\s/-]?[0-9]{2}\b",
                0.3,
            ),
            Pattern::new("Tax ID (continuous)", r"\b[1-9][0-9]{10}\b", 0.2),
        ])
        .context(CONTEXT.iter().copied())
        .validator(DeTaxIdValidator)
}
