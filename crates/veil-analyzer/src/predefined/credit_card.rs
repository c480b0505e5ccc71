//! Credit card numbers validated with Luhn

use crate::pattern::{Pattern, PatternRecognizer, PatternRecognizerBuilder, PatternValidator};
use crate::validators::{luhn, sanitize_value};

pub const NAME: &str = "CreditCardRecognizer";
pub const ENTITY: &str = "CREDIT_CARD";

const CONTEXT: &[&str] = &[
    "credit",
    "card",
    "visa",
    "mastercard",
    "cc",
    "amex",
    "discover",
    "jcb",
    "diners",
    "maestro",
    "instapayment",
];

pub struct CreditCardValidator;

impl PatternValidator for CreditCardValidator {
    fn validate_result(&self, pattern_text: &str) -> Option<bool> {
        let sanitized = sanitize_value(pattern_text, &[("-", ""), (" ", "")]);
        Some(luhn(&sanitized))
    }
}

pub fn builder() -> PatternRecognizerBuilder {
    PatternRecognizer::builder(ENTITY)
        .name(NAME)
        .pattern(Pattern::new(
            "All Credit Cards (weak)",
            r"\b((4\d{3})|(5[0-5]\d{2})|(6\d{3})|(1\d{3})|(3\d{3}))[- ]?(\d{3,4})[- ]?(\d{3,4})[- ]?(\d{3,5})\b",
            0.3,
        ))
        .context(CONTEXT.iter().copied())
        .validator(CreditCardValidator)
}
