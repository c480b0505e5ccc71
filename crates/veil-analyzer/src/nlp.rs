//! NLP collaborator interface
//!
//! The analyzer only needs tokens, their offsets, lemmas, a filtered keyword
//! list and coarse named-entity spans. Anything that can produce that shape can
//! back the pipeline.

mod simple_engine;

pub use simple_engine::SimpleNlpEngine;

use serde::{Deserialize, Serialize};
use veil_core::Result;

/// A coarse named-entity span reported by the NLP engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NlpEntity {
    /// Model label (e.g. `PERSON`, `GPE`)
    pub label: String,

    /// Start byte offset
    pub start: usize,

    /// End byte offset (exclusive)
    pub end: usize,
}

/// Per-request output of the NLP engine, consumed read-only by recognizers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NlpArtifacts {
    /// Token strings in text order
    pub tokens: Vec<String>,

    /// Start byte offset of each token
    pub token_offsets: Vec<usize>,

    /// Lemma of each token
    pub lemmas: Vec<String>,

    /// Lower-cased lemmas without stopwords, punctuation or copula
    pub keywords: Vec<String>,

    /// Coarse named-entity spans
    pub entities: Vec<NlpEntity>,

    /// Language the text was processed as
    pub language: String,
}

impl NlpArtifacts {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// The external natural-language collaborator
pub trait NlpEngine: Send + Sync {
    /// Tokenize, lemmatize and tag `text`
    fn process_text(&self, text: &str, language: &str) -> Result<NlpArtifacts>;

    fn is_stopword(&self, word: &str, language: &str) -> bool;

    fn is_punct(&self, word: &str, language: &str) -> bool;

    /// Languages this engine can process
    fn supported_languages(&self) -> Vec<String>;
}
