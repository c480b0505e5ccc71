//! Regex patterns and the pattern recognizer

mod pattern_recognizer;

pub use pattern_recognizer::{PatternRecognizer, PatternRecognizerBuilder};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use veil_core::{Error, Result};

/// A named regex with the score assigned to its matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// Pattern name, reported in explanations
    pub name: String,

    /// Regex source
    pub regex: String,

    /// Base score for matches, in `[0, 1]`
    pub score: f64,
}

impl Pattern {
    pub fn new(name: impl Into<String>, regex: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            regex: regex.into(),
            score,
        }
    }
}

/// Flags applied when compiling patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegexFlags {
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_matches_new_line: bool,
}

impl Default for RegexFlags {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            multi_line: true,
            dot_matches_new_line: true,
        }
    }
}

impl RegexFlags {
    pub fn compile(&self, pattern: &str) -> std::result::Result<Regex, regex::Error> {
        RegexBuilder::new(pattern)
            .case_insensitive(self.case_insensitive)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_matches_new_line)
            .build()
    }
}

/// Checksum and heuristic hooks for a pattern recognizer
///
/// `validate_result` returns `Some(true)` to force the score to 1.0,
/// `Some(false)` to drop the match and `None` to keep the pattern score.
/// `invalidate_result` returning `Some(true)` drops the match regardless.
pub trait PatternValidator: Send + Sync {
    fn validate_result(&self, _pattern_text: &str) -> Option<bool> {
        None
    }

    fn invalidate_result(&self, _pattern_text: &str) -> Option<bool> {
        None
    }
}

pub(crate) fn validate_score(name: &str, score: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&score) {
        return Err(Error::InvalidConfiguration(format!(
            "Pattern '{}' has score {} outside [0, 1]",
            name, score
        )));
    }
    Ok(())
}
