//! Email addresses

use crate::pattern::{Pattern, PatternRecognizer, PatternRecognizerBuilder, PatternValidator};

pub const NAME: &str = "EmailRecognizer";
pub const ENTITY: &str = "EMAIL_ADDRESS";

pub struct EmailValidator;

impl PatternValidator for EmailValidator {
    /// Reject addresses whose top-level domain is not alphabetic
    fn validate_result(&self, pattern_text: &str) -> Option<bool> {
        let domain = pattern_text.rsplit_once('@').map(|(_, d)| d)?;
        let tld = domain.rsplit_once('.').map(|(_, t)| t)?;
        if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
            return Some(false);
        }
        None
    }
}

pub fn builder() -> PatternRecognizerBuilder {
    PatternRecognizer::builder(ENTITY)
        .name(NAME)
        .pattern(Pattern::new(
            "Email (Medium)",
            r"\b[A-Z0-9!#$%&'*+/=?^_`{|}~\-]+(?:\.[A-Z0-9!#$%&'*+/=?^_`{|}~\-]+)*@[A-Z0-9](?:[A-Z0-9\-]*[A-Z0-9])?(?:\.[A-Z0-9](?:[A-Z0-9\-]*[A-Z0-9])?)+\b",
            0.5,
        ))
        .context(["email"])
        .validator(EmailValidator)
}
