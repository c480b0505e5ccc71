//! International bank account numbers validated with MOD 97-10

use crate::pattern::{Pattern, PatternRecognizer, PatternRecognizerBuilder, PatternValidator};
use crate::validators::{iban_mod_97, sanitize_value};

pub const NAME: &str = "IbanRecognizer";
pub const ENTITY: &str = "IBAN_CODE";

pub struct IbanValidator;

impl PatternValidator for IbanValidator {
    fn validate_result(&self, pattern_text: &str) -> Option<bool> {
        let sanitized = sanitize_value(pattern_text, &[(" ", ""), ("-", "")]).to_uppercase();
        let well_formed = (15..=34).contains(&sanitized.len())
            && sanitized.chars().take(2).all(|c| c.is_ascii_uppercase())
            && sanitized.chars().all(|c| c.is_ascii_alphanumeric());
        Some(well_formed && iban_mod_97(&sanitized))
    }
}

pub fn builder() -> PatternRecognizerBuilder {
    PatternRecognizer::builder(ENTITY)
        .name(NAME)
        .pattern(Pattern::new(
            "IBAN Generic",
            r"\b[A-Z]{2}[0-9]{2}(?:[ \-]?[A-Z0-9]{4}){2,7}(?:[ \-]?[A-Z0-9]{1,3})?\b",
            0.5,
        ))
        .context(["iban", "bank", "transaction"])
        .validator(IbanValidator)
}
