//! Analyzer configuration

use crate::context::ContextMatchMode;
use crate::pattern::RegexFlags;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, warn};
use veil_core::{Error, Result};

pub use veil_observability::LoggingConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Languages the engine accepts requests for
    #[serde(default = "default_supported_languages")]
    pub supported_languages: Vec<String>,

    /// Minimum score a result needs to be returned, when the request sets none
    #[serde(default)]
    pub default_score_threshold: f64,

    #[serde(default)]
    pub context: ContextConfig,

    /// Flags for the predefined recognizers built by `AnalyzerEngine::from_config`
    #[serde(default)]
    pub regex_flags: RegexFlags,

    /// Run recognizers on the rayon thread pool
    #[serde(default = "default_false")]
    pub parallel: bool,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Context enhancement settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Added to a result's score when a context word is found
    #[serde(default = "default_similarity_factor")]
    pub similarity_factor: f64,

    /// Floor applied to context-enhanced scores
    #[serde(default = "default_min_score_with_context_similarity")]
    pub min_score_with_context_similarity: f64,

    /// Keywords to look at before the match (the match's own token included)
    #[serde(default = "default_prefix_count")]
    pub prefix_count: usize,

    /// Keywords to look at after the match
    #[serde(default)]
    pub suffix_count: usize,

    #[serde(default)]
    pub match_mode: ContextMatchMode,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            similarity_factor: default_similarity_factor(),
            min_score_with_context_similarity: default_min_score_with_context_similarity(),
            prefix_count: default_prefix_count(),
            suffix_count: 0,
            match_mode: ContextMatchMode::default(),
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            supported_languages: default_supported_languages(),
            default_score_threshold: 0.0,
            context: ContextConfig::default(),
            regex_flags: RegexFlags::default(),
            parallel: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Load from a YAML or TOML file (chosen by extension, YAML by default)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = parse_config_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("VEIL_LOG_LEVEL") {
            self.logging.level = val;
        }

        if let Ok(val) = std::env::var("VEIL_SCORE_THRESHOLD") {
            match val.parse::<f64>() {
                Ok(threshold) if (0.0..=1.0).contains(&threshold) => {
                    self.default_score_threshold = threshold
                }
                _ => warn!("Invalid VEIL_SCORE_THRESHOLD '{}', keeping {}", val, self.default_score_threshold),
            }
        }

        if let Ok(val) = std::env::var("VEIL_CONTEXT_MATCH_MODE") {
            match val.to_lowercase().as_str() {
                "whole_word" => self.context.match_mode = ContextMatchMode::WholeWord,
                "substring" => self.context.match_mode = ContextMatchMode::Substring,
                _ => warn!("Invalid VEIL_CONTEXT_MATCH_MODE '{}', using default", val),
            }
        }

        if let Ok(val) = std::env::var("VEIL_PARALLEL") {
            if let Ok(enabled) = val.parse::<bool>() {
                self.parallel = enabled;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.supported_languages.is_empty() {
            return Err(Error::InvalidConfiguration(
                "supported_languages must not be empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.default_score_threshold) {
            return Err(Error::InvalidConfiguration(format!(
                "default_score_threshold {} is outside [0, 1]",
                self.default_score_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.context.min_score_with_context_similarity)
            || self.context.similarity_factor < 0.0
        {
            return Err(Error::InvalidConfiguration(
                "context scores must be non-negative and at most 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand a leading `~` to the home directory
pub(crate) fn expand_home(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => Ok(dirs::home_dir()
            .ok_or_else(|| {
                Error::InvalidConfiguration("Could not determine home directory".to_string())
            })?
            .join(rest)),
        Err(_) => Ok(path.to_path_buf()),
    }
}

pub(crate) fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("toml")
}

/// Parse configuration text as TOML or YAML
pub(crate) fn parse_config_str<T: DeserializeOwned>(contents: &str, toml: bool) -> Result<T> {
    if toml {
        toml::from_str(contents).map_err(|e| {
            error!("Failed to parse TOML config: {}", e);
            Error::InvalidConfiguration(format!("Invalid TOML: {}", e))
        })
    } else {
        serde_yaml::from_str(contents).map_err(|e| {
            error!("Failed to parse YAML config: {}", e);
            Error::InvalidConfiguration(format!("Invalid YAML: {}", e))
        })
    }
}

pub(crate) fn parse_config_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let path = expand_home(path)?;
    let contents = std::fs::read_to_string(&path).map_err(|e| {
        error!("Failed to read config file {:?}: {}", path, e);
        Error::Io(e)
    })?;
    parse_config_str(&contents, is_toml(&path))
}

fn default_supported_languages() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_similarity_factor() -> f64 {
    0.35
}

fn default_min_score_with_context_similarity() -> f64 {
    0.4
}

fn default_prefix_count() -> usize {
    5
}

fn default_false() -> bool {
    false
}
