//! Registry configuration documents (YAML or TOML)

use crate::config::{parse_config_file, parse_config_str};
use crate::pattern::{Pattern, PatternRecognizer, RegexFlags};
use crate::predefined::{NLP_RECOGNIZER_NAME, PredefinedOptions, build_predefined};
use crate::recognizer::RegisteredRecognizer;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, error};
use veil_core::{Error, Result};

/// Which recognizers a registry holds, per language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub supported_languages: Vec<String>,

    /// Overrides the default regex flags of every recognizer in this document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_regex_flags: Option<RegexFlags>,

    pub recognizers: Vec<RecognizerConfigEntry>,
}

/// A recognizer entry: a bare predefined name or a full definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecognizerConfigEntry {
    Name(String),
    Full(RecognizerConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecognizerConfig {
    Predefined(PredefinedRecognizerConfig),
    Custom(CustomRecognizerConfig),
}

/// A language code, optionally with language-specific context words
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LanguageConfig {
    Code(String),
    Scoped {
        language: String,
        #[serde(default)]
        context: Option<Vec<String>>,
    },
}

impl LanguageConfig {
    pub fn language(&self) -> &str {
        match self {
            Self::Code(language) => language,
            Self::Scoped { language, .. } => language,
        }
    }

    pub fn context(&self) -> Option<&[String]> {
        match self {
            Self::Code(_) => None,
            Self::Scoped { context, .. } => context.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredefinedRecognizerConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_languages: Option<Vec<LanguageConfig>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_language: Option<String>,

    /// Replaces the built-in context words
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<String>>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// An inline pattern recognizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRecognizerConfig {
    pub name: String,

    pub supported_entity: String,

    #[serde(default)]
    pub patterns: Vec<Pattern>,

    #[serde(default)]
    pub deny_list: Vec<String>,

    #[serde(default)]
    pub context: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_languages: Option<Vec<LanguageConfig>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Languages an entry asks for; `None` means "let the caller decide"
fn requested_languages(
    supported_languages: &Option<Vec<LanguageConfig>>,
    supported_language: &Option<String>,
) -> Option<Vec<LanguageConfig>> {
    match (supported_languages, supported_language) {
        (Some(languages), _) => Some(languages.clone()),
        (None, Some(language)) => Some(vec![LanguageConfig::Code(language.clone())]),
        (None, None) => None,
    }
}

fn check_language(recognizer: &str, language: &str, supported: &[String]) -> Result<()> {
    if supported.iter().any(|l| l == language) {
        return Ok(());
    }
    error!(recognizer, language, "Recognizer language is not supported by the registry");
    Err(Error::InvalidConfiguration(format!(
        "Recognizer '{}' uses language '{}' which is not in supported_languages {:?}",
        recognizer, language, supported
    )))
}

impl CustomRecognizerConfig {
    /// Build one pattern recognizer per language
    ///
    /// Entries without explicit languages are registered for every language in
    /// `default_languages`.
    pub fn build(
        &self,
        default_languages: &[String],
        regex_flags: RegexFlags,
    ) -> Result<Vec<RegisteredRecognizer>> {
        let languages = requested_languages(&self.supported_languages, &self.supported_language)
            .unwrap_or_else(|| {
                default_languages
                    .iter()
                    .cloned()
                    .map(LanguageConfig::Code)
                    .collect()
            });

        languages
            .iter()
            .map(|language| {
                let context = language.context().unwrap_or(&self.context);
                let mut builder = PatternRecognizer::builder(self.supported_entity.as_str())
                    .name(self.name.as_str())
                    .language(language.language())
                    .patterns(self.patterns.iter().cloned())
                    .deny_list(self.deny_list.iter().cloned())
                    .context(context.iter().cloned())
                    .regex_flags(regex_flags);
                if let Some(version) = &self.version {
                    builder = builder.version(version.as_str());
                }
                Ok(RegisteredRecognizer::new(builder.build()?))
            })
            .collect()
    }
}

impl PredefinedRecognizerConfig {
    fn build(
        &self,
        registry_languages: &[String],
        regex_flags: RegexFlags,
    ) -> Result<Vec<RegisteredRecognizer>> {
        let languages = requested_languages(&self.supported_languages, &self.supported_language);

        let Some(languages) = languages else {
            // The NLP recognizer serves every registry language; catalog entries
            // keep their own default language
            if self.name == NLP_RECOGNIZER_NAME {
                return registry_languages
                    .iter()
                    .map(|language| self.build_one(Some(language.clone()), None, regex_flags))
                    .collect();
            }
            let recognizer = self.build_one(None, None, regex_flags)?;
            check_language(&self.name, recognizer.supported_language(), registry_languages)?;
            return Ok(vec![recognizer]);
        };

        languages
            .iter()
            .map(|language| {
                check_language(&self.name, language.language(), registry_languages)?;
                self.build_one(
                    Some(language.language().to_string()),
                    language.context(),
                    regex_flags,
                )
            })
            .collect()
    }

    fn build_one(
        &self,
        language: Option<String>,
        context: Option<&[String]>,
        regex_flags: RegexFlags,
    ) -> Result<RegisteredRecognizer> {
        build_predefined(
            &self.name,
            &PredefinedOptions {
                language,
                context: context.map(<[String]>::to_vec).or_else(|| self.context.clone()),
                regex_flags,
            },
        )
    }
}

impl RegistryConfig {
    /// Load from a YAML or TOML file (chosen by extension, YAML by default)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = parse_config_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: Self = parse_config_str(contents, false)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.supported_languages.is_empty() {
            return Err(Error::InvalidConfiguration(
                "Registry configuration requires at least one supported language".to_string(),
            ));
        }
        Ok(())
    }

    /// Instantiate every enabled recognizer in the document
    pub fn build_recognizers(&self) -> Result<Vec<RegisteredRecognizer>> {
        let flags = self.global_regex_flags.unwrap_or_default();
        let mut recognizers = Vec::new();

        for entry in &self.recognizers {
            let built = match entry {
                RecognizerConfigEntry::Name(name) => PredefinedRecognizerConfig {
                    name: name.clone(),
                    supported_languages: None,
                    supported_language: None,
                    context: None,
                    enabled: true,
                }
                .build(&self.supported_languages, flags)?,
                RecognizerConfigEntry::Full(RecognizerConfig::Predefined(config)) => {
                    if !config.enabled {
                        debug!(recognizer = %config.name, "Skipping disabled recognizer");
                        continue;
                    }
                    config.build(&self.supported_languages, flags)?
                }
                RecognizerConfigEntry::Full(RecognizerConfig::Custom(config)) => {
                    if !config.enabled {
                        debug!(recognizer = %config.name, "Skipping disabled recognizer");
                        continue;
                    }
                    for language in config
                        .supported_languages
                        .iter()
                        .flatten()
                        .map(LanguageConfig::language)
                        .chain(config.supported_language.as_deref())
                    {
                        check_language(&config.name, language, &self.supported_languages)?;
                    }
                    config.build(&self.supported_languages, flags)?
                }
            };
            recognizers.extend(built);
        }

        Ok(recognizers)
    }
}

/// A document holding only custom recognizers, as served by a [`RecognizerStore`]
///
/// [`RecognizerStore`]: super::RecognizerStore
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomRecognizerSet {
    #[serde(default)]
    pub recognizers: Vec<CustomRecognizerConfig>,
}
