//! Context-word score enhancement
//!
//! A recognizer may declare context words ("license", "ssn", ...). When one of
//! them appears among the keywords surrounding a match, the match's score is
//! raised. Enhancement never removes or reorders results and never mutates the
//! caller's list.

use crate::config::ContextConfig;
use crate::nlp::NlpArtifacts;
use crate::recognizer::RegisteredRecognizer;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};
use veil_core::{Error, RecognizerResult, Result};

const MAX_SCORE: f64 = 1.0;

/// How surrounding words are compared with a recognizer's context words
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextMatchMode {
    /// Case-insensitive equality
    #[default]
    WholeWord,
    /// Case-insensitive containment in either direction
    Substring,
}

impl ContextMatchMode {
    fn matches(self, context_word: &str, surrounding_word: &str) -> bool {
        match self {
            Self::WholeWord => context_word == surrounding_word,
            Self::Substring => {
                surrounding_word.contains(context_word) || context_word.contains(surrounding_word)
            }
        }
    }
}

/// Post-processes recognizer output using surrounding words
pub trait ContextAwareEnhancer: Send + Sync {
    /// Return a copy of `raw_results` with context-supported scores raised
    fn enhance_using_context(
        &self,
        text: &str,
        raw_results: &[RecognizerResult],
        nlp_artifacts: &NlpArtifacts,
        recognizers: &[RegisteredRecognizer],
        context: &[String],
    ) -> Result<Vec<RecognizerResult>>;
}

/// Compares recognizer context words with the lemmas preceding (and following) a match
#[derive(Debug, Clone)]
pub struct LemmaContextAwareEnhancer {
    context_similarity_factor: f64,
    min_score_with_context_similarity: f64,
    context_prefix_count: usize,
    context_suffix_count: usize,
    match_mode: ContextMatchMode,
}

impl LemmaContextAwareEnhancer {
    pub fn new(config: &ContextConfig) -> Self {
        Self {
            context_similarity_factor: config.similarity_factor,
            min_score_with_context_similarity: config.min_score_with_context_similarity,
            context_prefix_count: config.prefix_count,
            context_suffix_count: config.suffix_count,
            match_mode: config.match_mode,
        }
    }

    pub fn match_mode(&self) -> ContextMatchMode {
        self.match_mode
    }

    /// Lower-cased keywords around the token containing `start`
    fn extract_surrounding_words(
        &self,
        nlp_artifacts: &NlpArtifacts,
        keywords: &HashSet<&str>,
        word: &str,
        start: usize,
    ) -> Result<Vec<String>> {
        if nlp_artifacts.tokens.is_empty() {
            return Ok(Vec::new());
        }

        let index = find_index_of_match_token(word, start, nlp_artifacts)?;
        let lemmas = &nlp_artifacts.lemmas;
        if index >= lemmas.len() {
            return Err(Error::TokenAlignment {
                word: word.to_string(),
                start,
            });
        }

        let mut words = Vec::new();
        // The match token itself takes a slot in each direction
        collect_keywords(
            lemmas[..=index].iter().rev(),
            self.context_prefix_count + 1,
            keywords,
            &mut words,
        );
        collect_keywords(
            lemmas[index..].iter(),
            self.context_suffix_count + 1,
            keywords,
            &mut words,
        );

        Ok(words)
    }

    /// First recognizer context word supported by the surrounding words
    fn find_supportive_word<'a>(
        &self,
        surrounding_words: &[String],
        recognizer_context: &'a [String],
    ) -> Option<&'a str> {
        recognizer_context
            .iter()
            .find(|context_word| {
                let context_word = context_word.to_lowercase();
                surrounding_words
                    .iter()
                    .any(|w| self.match_mode.matches(&context_word, w))
            })
            .map(String::as_str)
    }
}

impl Default for LemmaContextAwareEnhancer {
    fn default() -> Self {
        Self::new(&ContextConfig::default())
    }
}

/// Take up to `count` lemmas that are keywords, lower-cased and de-duplicated
fn collect_keywords<'a>(
    lemmas: impl Iterator<Item = &'a String>,
    count: usize,
    keywords: &HashSet<&str>,
    words: &mut Vec<String>,
) {
    let mut remaining = count;
    for lemma in lemmas {
        if remaining == 0 {
            break;
        }
        let lower = lemma.to_lowercase();
        if keywords.contains(lower.as_str()) {
            if !words.contains(&lower) {
                words.push(lower);
            }
            remaining -= 1;
        }
    }
}

/// Index of the first token that starts at or extends past `start`
fn find_index_of_match_token(
    word: &str,
    start: usize,
    nlp_artifacts: &NlpArtifacts,
) -> Result<usize> {
    nlp_artifacts
        .tokens
        .iter()
        .zip(&nlp_artifacts.token_offsets)
        .position(|(token, &offset)| offset == start || start < offset + token.len())
        .ok_or_else(|| Error::TokenAlignment {
            word: word.to_string(),
            start,
        })
}

/// Split caller-supplied context phrases into lower-cased words, keeping the phrase too
fn normalize_extra_context(context: &[String]) -> Vec<String> {
    let mut words = Vec::new();
    for phrase in context {
        let lower = phrase.to_lowercase();
        words.extend(lower.split_whitespace().map(str::to_string));
        if lower.contains(char::is_whitespace) {
            words.push(lower);
        }
    }
    words
}

impl ContextAwareEnhancer for LemmaContextAwareEnhancer {
    fn enhance_using_context(
        &self,
        text: &str,
        raw_results: &[RecognizerResult],
        nlp_artifacts: &NlpArtifacts,
        recognizers: &[RegisteredRecognizer],
        context: &[String],
    ) -> Result<Vec<RecognizerResult>> {
        let mut results = raw_results.to_vec();

        let by_id: HashMap<&str, &RegisteredRecognizer> =
            recognizers.iter().map(|r| (r.id(), r)).collect();
        let keywords: HashSet<&str> = nlp_artifacts.keywords.iter().map(String::as_str).collect();
        let extra_context = normalize_extra_context(context);

        for result in &mut results {
            let recognizer_id = result.recognition_metadata.recognizer_identifier.as_str();
            let Some(recognizer) = by_id.get(recognizer_id) else {
                debug!(recognizer_id, "Recognizer not found for result, skipping context");
                continue;
            };

            let recognizer_context = recognizer.context();
            if recognizer_context.is_empty() || result.is_score_enhanced_by_context() {
                continue;
            }

            let word = text.get(result.start..result.end).unwrap_or_default();
            let mut surrounding_words =
                self.extract_surrounding_words(nlp_artifacts, &keywords, word, result.start)?;
            surrounding_words.extend(extra_context.iter().cloned());

            let Some(supportive_word) =
                self.find_supportive_word(&surrounding_words, recognizer_context)
            else {
                continue;
            };

            let score = (result.score + self.context_similarity_factor)
                .max(self.min_score_with_context_similarity)
                .min(MAX_SCORE);
            result.set_score(score);
            if let Some(explanation) = result.analysis_explanation.as_mut() {
                explanation.set_supportive_context_word(supportive_word);
                explanation.set_improved_score(result.score);
            }
            result.recognition_metadata.is_score_enhanced_by_context = true;

            trace!(
                entity_type = %result.entity_type,
                supportive_word,
                score = result.score,
                "Context enhanced result"
            );
        }

        Ok(results)
    }
}
