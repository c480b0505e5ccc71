//! Built-in recognizer catalog

pub mod credit_card;
pub mod de_tax_id;
pub mod email;
pub mod iban;
pub mod in_aadhaar;
pub mod ip;
pub mod us_driver_license;
pub mod us_ssn;

use crate::pattern::{PatternRecognizerBuilder, RegexFlags};
use crate::recognizer::{NlpRecognizer, RegisteredRecognizer};
use tracing::error;
use veil_core::{Error, Result};

/// Name of the NLP-backed recognizer in the catalog
pub const NLP_RECOGNIZER_NAME: &str = "NlpRecognizer";

/// A catalog entry for a predefined pattern recognizer
pub struct PredefinedEntry {
    pub name: &'static str,
    pub entity: &'static str,
    pub default_language: &'static str,
    builder: fn() -> PatternRecognizerBuilder,
}

pub static CATALOG: &[PredefinedEntry] = &[
    PredefinedEntry {
        name: credit_card::NAME,
        entity: credit_card::ENTITY,
        default_language: "en",
        builder: credit_card::builder,
    },
    PredefinedEntry {
        name: email::NAME,
        entity: email::ENTITY,
        default_language: "en",
        builder: email::builder,
    },
    PredefinedEntry {
        name: ip::NAME,
        entity: ip::ENTITY,
        default_language: "en",
        builder: ip::builder,
    },
    PredefinedEntry {
        name: iban::NAME,
        entity: iban::ENTITY,
        default_language: "en",
        builder: iban::builder,
    },
    PredefinedEntry {
        name: us_ssn::NAME,
        entity: us_ssn::ENTITY,
        default_language: "en",
        builder: us_ssn::builder,
    },
    PredefinedEntry {
        name: us_driver_license::NAME,
        entity: us_driver_license::ENTITY,
        default_language: "en",
        builder: us_driver_license::builder,
    },
    PredefinedEntry {
        name: in_aadhaar::NAME,
        entity: in_aadhaar::ENTITY,
        default_language: "en",
        builder: in_aadhaar::builder,
    },
    PredefinedEntry {
        name: de_tax_id::NAME,
        entity: de_tax_id::ENTITY,
        default_language: "de",
        builder: de_tax_id::builder,
    },
];

/// Overrides applied when instantiating a catalog entry
#[derive(Debug, Clone, Default)]
pub struct PredefinedOptions {
    /// Language to register for; the entry's default when `None`
    pub language: Option<String>,
    /// Replaces the built-in context words
    pub context: Option<Vec<String>>,
    pub regex_flags: RegexFlags,
}

/// Instantiate a predefined recognizer by name
pub fn build_predefined(name: &str, options: &PredefinedOptions) -> Result<RegisteredRecognizer> {
    if name == NLP_RECOGNIZER_NAME {
        let language = options.language.as_deref().unwrap_or("en");
        return Ok(RegisteredRecognizer::new(NlpRecognizer::new(language)));
    }

    let Some(entry) = CATALOG.iter().find(|e| e.name == name) else {
        error!(name, "Unknown predefined recognizer");
        return Err(Error::InvalidConfiguration(format!(
            "Unknown predefined recognizer '{}'",
            name
        )));
    };

    let language = options
        .language
        .clone()
        .unwrap_or_else(|| entry.default_language.to_string());
    let mut builder = (entry.builder)()
        .language(language)
        .regex_flags(options.regex_flags);
    if let Some(context) = &options.context {
        builder = builder.clear_context().context(context.iter().cloned());
    }

    Ok(RegisteredRecognizer::new(builder.build()?))
}

/// Every catalog recognizer whose default language is in `languages`, plus one
/// NLP recognizer per language
pub fn default_recognizers(
    languages: &[String],
    regex_flags: RegexFlags,
) -> Result<Vec<RegisteredRecognizer>> {
    let mut recognizers = Vec::new();
    for language in languages {
        for entry in CATALOG.iter().filter(|e| e.default_language == language) {
            recognizers.push(build_predefined(
                entry.name,
                &PredefinedOptions {
                    language: Some(language.clone()),
                    context: None,
                    regex_flags,
                },
            )?);
        }
        recognizers.push(RegisteredRecognizer::new(NlpRecognizer::new(language.as_str())));
    }
    Ok(recognizers)
}
