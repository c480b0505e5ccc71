//! Decision-process trace attached to a recognizer result

use serde::{Deserialize, Serialize};

/// Explains how a result was produced and how its score evolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisExplanation {
    /// Name of the recognizer that produced the result
    pub recognizer: String,

    /// Score assigned by the recognizer before any post-processing
    pub original_score: f64,

    /// Current score
    pub score: f64,

    /// Name of the pattern that matched, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_name: Option<String>,

    /// Regex source of the pattern that matched, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Outcome of the checksum hook (`None` when the recognizer abstained)
    #[serde(default)]
    pub validation_result: Option<bool>,

    /// Free-form explanation lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textual_explanation: Option<String>,

    /// Score delta contributed by surrounding context
    #[serde(default)]
    pub score_context_improvement: f64,

    /// Context word that triggered the improvement
    #[serde(default)]
    pub supportive_context_word: String,
}

impl AnalysisExplanation {
    pub fn new(recognizer: impl Into<String>, original_score: f64) -> Self {
        Self {
            recognizer: recognizer.into(),
            original_score,
            score: original_score,
            pattern_name: None,
            pattern: None,
            validation_result: None,
            textual_explanation: None,
            score_context_improvement: 0.0,
            supportive_context_word: String::new(),
        }
    }

    /// Attach the pattern that produced the match
    pub fn with_pattern(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.pattern_name = Some(name.into());
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_textual_explanation(mut self, line: impl Into<String>) -> Self {
        self.append_textual_explanation_line(line);
        self
    }

    /// Update the score and keep the context improvement in sync
    pub fn set_improved_score(&mut self, score: f64) {
        self.score = score;
        self.score_context_improvement = round_improvement(score - self.original_score);
    }

    pub fn set_supportive_context_word(&mut self, word: impl Into<String>) {
        self.supportive_context_word = word.into();
    }

    pub fn append_textual_explanation_line(&mut self, line: impl Into<String>) {
        let line = line.into();
        self.textual_explanation = Some(match self.textual_explanation.take() {
            Some(existing) => format!("{existing}\n{line}"),
            None => line,
        });
    }
}

fn round_improvement(delta: f64) -> f64 {
    (delta * 1e9).round() / 1e9
}
