//! US driver license numbers

use crate::pattern::{Pattern, PatternRecognizer, PatternRecognizerBuilder, PatternValidator};

pub const NAME: &str = "UsLicenseRecognizer";
pub const ENTITY: &str = "US_DRIVER_LICENSE";

const CONTEXT: &[&str] = &[
    "driver",
    "license",
    "permit",
    "lic",
    "identification",
    "dls",
    "cdls",
    "lic#",
    "driving",
];

const ALPHANUMERIC: &str = r"\b([A-Z][0-9]{3,6}|[A-Z][0-9]{5,9}|[A-Z][0-9]{6,8}|[A-Z][0-9]{4,8}|[A-Z][0-9]{9,11}|[A-Z]{1,2}[0-9]{5,6}|H[0-9]{8}|V[0-9]{6}|X[0-9]{8}|[A-Z]{2}[0-9]{2,5}|[A-Z]{2}[0-9]{3,7}|[0-9]{2}[A-Z]{3}[0-9]{5,6}|[A-Z][0-9]{13,14}|[A-Z][0-9]{18}|[A-Z][0-9]{6}R|[A-Z][0-9]{9}|[A-Z][0-9]{1,12}|[0-9]{9}[A-Z]|[A-Z]{2}[0-9]{6}[A-Z]|[0-9]{8}[A-Z]{2}|[0-9]{3}[A-Z]{2}[0-9]{4}|[A-Z][0-9][A-Z][0-9][A-Z]|[0-9]{7,8}[A-Z])\b";

/// Washington licenses must contain a digit or an asterisk
pub struct UsLicenseValidator;

impl PatternValidator for UsLicenseValidator {
    fn invalidate_result(&self, pattern_text: &str) -> Option<bool> {
        Some(!pattern_text.chars().any(|c| c.is_ascii_digit() || c == '*'))
    }
}

pub fn builder() -> PatternRecognizerBuilder {
    PatternRecognizer::builder(ENTITY)
        .name(NAME)
        .patterns([
            Pattern::new("Driver License - WA (weak)", r"\b[A-Z][A-Z0-9*]{11}\b", 0.4),
            Pattern::new("Driver License - Alphanumeric (weak)", ALPHANUMERIC, 0.3),
            Pattern::new(
                "Driver License - Digits (very weak)",
                r"\b([0-9]{6,14}|[0-9]{16})\b",
                0.01,
            ),
        ])
        .context(CONTEXT.iter().copied())
        .validator(UsLicenseValidator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::EntityRecognizer;

    #[test]
    fn test_weak_wa_licenses() {
        let recognizer = builder().build().unwrap();
        let results = recognizer
            .analyze("AA1B2**9ABA7 A*1234AB*CD9", &[], None)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.score == 0.4));
    }

    #[test]
    fn test_alphanumeric_license() {
        let recognizer = builder().build().unwrap();
        let text = "license is AC432223";
        let results = recognizer.analyze(text, &[], None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(&text[results[0].start..results[0].end], "AC432223");
        assert_eq!(results[0].score, 0.3);
    }

    #[test]
    fn test_invalid_licenses() {
        let recognizer = builder().build().unwrap();
        assert!(recognizer.analyze("C12T345672", &[], None).unwrap().is_empty());
        assert!(recognizer.analyze("Verification", &[], None).unwrap().is_empty());
    }
}
