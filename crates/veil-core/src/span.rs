//! The scored span shared by every pipeline stage

use crate::explanation::AnalysisExplanation;
use serde::{Deserialize, Serialize};

/// Identifies the recognizer a result came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionMetadata {
    /// Human-readable recognizer name
    #[serde(default)]
    pub recognizer_name: String,

    /// Unique recognizer id, used to find the owning recognizer after analysis
    #[serde(default)]
    pub recognizer_identifier: String,

    /// Set once the context enhancer boosted this result
    #[serde(default)]
    pub is_score_enhanced_by_context: bool,
}

/// A detected entity: `[start, end)` byte offsets into the analyzed text plus a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizerResult {
    /// Entity type label (e.g. `CREDIT_CARD`)
    pub entity_type: String,

    /// Start offset (inclusive)
    pub start: usize,

    /// End offset (exclusive)
    pub end: usize,

    /// Confidence score in `[0, 1]`
    pub score: f64,

    /// Decision-process trace, present only when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_explanation: Option<AnalysisExplanation>,

    #[serde(default)]
    pub recognition_metadata: RecognitionMetadata,
}

impl RecognizerResult {
    /// Create a result; the score is normalized with [`normalize_score`]
    pub fn new(entity_type: impl Into<String>, start: usize, end: usize, score: f64) -> Self {
        Self {
            entity_type: entity_type.into(),
            start,
            end,
            score: normalize_score(score),
            analysis_explanation: None,
            recognition_metadata: RecognitionMetadata::default(),
        }
    }

    pub fn with_explanation(mut self, explanation: AnalysisExplanation) -> Self {
        self.analysis_explanation = Some(explanation);
        self
    }

    pub fn with_metadata(mut self, metadata: RecognitionMetadata) -> Self {
        self.recognition_metadata = metadata;
        self
    }

    /// Set the score, normalized with [`normalize_score`]
    pub fn set_score(&mut self, score: f64) {
        self.score = normalize_score(score);
    }

    /// Length of the span in bytes
    pub fn span_len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Same start and end
    pub fn equal_indices(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }

    /// `self` fully covers `other`
    pub fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && self.end >= other.end
    }

    /// Number of overlapping bytes, 0 when disjoint
    pub fn intersects(&self, other: &Self) -> usize {
        if self.end <= other.start || other.end <= self.start {
            return 0;
        }
        self.end.min(other.end) - self.start.max(other.start)
    }

    pub fn is_score_enhanced_by_context(&self) -> bool {
        self.recognition_metadata.is_score_enhanced_by_context
    }

    /// The matched slice of `text`, if the offsets are valid for it
    pub fn text_in<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }
}

/// Scores are kept to nine decimal places so that sums such as `0.3 + 0.35`
/// compare equal to the literal they denote
const SCORE_SCALE: f64 = 1e9;

/// Clamp to `[0, 1]` and drop floating-point noise below the score precision
pub fn normalize_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    (score.clamp(0.0, 1.0) * SCORE_SCALE).round() / SCORE_SCALE
}

#[cfg(test)]
mod tests;
