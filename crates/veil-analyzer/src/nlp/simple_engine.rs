//! Rule-based NLP engine
//!
//! Tokenizes with a regex, uses the lower-cased token as its lemma and reports
//! named entities from a caller-supplied gazetteer.

use crate::nlp::{NlpArtifacts, NlpEngine, NlpEntity};
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use veil_core::{Error, Result};

static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\w+(?:['\-]\w+)*#?|[^\w\s]").expect("token regex is valid")
});

static EN_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

static DE_STOPWORDS: &[&str] = &[
    "aber", "als", "am", "an", "auch", "auf", "aus", "bei", "bin", "bis", "bist", "da", "das",
    "dass", "dein", "dem", "den", "der", "des", "die", "dir", "du", "ein", "eine", "einem",
    "einen", "einer", "er", "es", "für", "hat", "ich", "ihr", "im", "in", "ist", "ja", "mein",
    "meine", "mit", "nach", "nicht", "noch", "oder", "sein", "sich", "sie", "sind", "so", "und",
    "uns", "von", "war", "was", "wie", "wir", "zu", "zum", "zur",
];

static STOPWORDS: Lazy<HashMap<&'static str, HashSet<&'static str>>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert("en", EN_STOPWORDS.iter().copied().collect());
    map.insert("de", DE_STOPWORDS.iter().copied().collect());
    map
});

/// Gazetteer phrases compiled into one automaton
struct Gazetteer {
    automaton: AhoCorasick,
    labels: Vec<String>,
}

/// Dependency-free [`NlpEngine`] backed by a regex tokenizer
#[derive(Clone)]
pub struct SimpleNlpEngine {
    languages: Vec<String>,
    phrases: Vec<(String, String)>,
    gazetteer: Option<Arc<Gazetteer>>,
}

impl SimpleNlpEngine {
    /// English and German, no gazetteer
    pub fn new() -> Self {
        Self {
            languages: vec!["en".to_string(), "de".to_string()],
            phrases: Vec::new(),
            gazetteer: None,
        }
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Report every whole-word occurrence of `phrase` as an entity labelled `label`
    pub fn with_entity_phrase(
        mut self,
        label: impl Into<String>,
        phrase: impl Into<String>,
    ) -> Result<Self> {
        self.phrases.push((label.into(), phrase.into()));
        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostLongest)
            .build(self.phrases.iter().map(|(_, p)| p.as_str()))
            .map_err(|e| Error::Nlp(format!("Failed to build gazetteer: {}", e)))?;
        let labels = self.phrases.iter().map(|(l, _)| l.clone()).collect();
        self.gazetteer = Some(Arc::new(Gazetteer { automaton, labels }));
        Ok(self)
    }

    fn find_entities(&self, text: &str) -> Vec<NlpEntity> {
        let Some(gazetteer) = &self.gazetteer else {
            return Vec::new();
        };

        gazetteer
            .automaton
            .find_iter(text)
            .filter(|m| is_word_boundary(text, m.start(), m.end()))
            .map(|m| NlpEntity {
                label: gazetteer.labels[m.pattern().as_usize()].clone(),
                start: m.start(),
                end: m.end(),
            })
            .collect()
    }
}

impl Default for SimpleNlpEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

impl NlpEngine for SimpleNlpEngine {
    fn process_text(&self, text: &str, language: &str) -> Result<NlpArtifacts> {
        if !self.languages.iter().any(|l| l == language) {
            return Err(Error::Nlp(format!(
                "Language '{}' is not supported by this NLP engine",
                language
            )));
        }

        let mut tokens = Vec::new();
        let mut token_offsets = Vec::new();
        for m in TOKEN_REGEX.find_iter(text) {
            tokens.push(m.as_str().to_string());
            token_offsets.push(m.start());
        }

        let lemmas: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();

        let keywords: Vec<String> = lemmas
            .iter()
            .filter(|lemma| {
                !self.is_stopword(lemma, language)
                    && !self.is_punct(lemma, language)
                    && lemma.as_str() != "be"
            })
            .flat_map(|lemma| lemma.split(':'))
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();

        let entities = self.find_entities(text);

        debug!(
            tokens = tokens.len(),
            keywords = keywords.len(),
            entities = entities.len(),
            "Processed text"
        );

        Ok(NlpArtifacts {
            tokens,
            token_offsets,
            lemmas,
            keywords,
            entities,
            language: language.to_string(),
        })
    }

    fn is_stopword(&self, word: &str, language: &str) -> bool {
        STOPWORDS
            .get(language)
            .is_some_and(|words| words.contains(word.to_lowercase().as_str()))
    }

    fn is_punct(&self, word: &str, _language: &str) -> bool {
        !word.is_empty() && word.chars().all(|c| !c.is_alphanumeric() && !c.is_whitespace())
    }

    fn supported_languages(&self) -> Vec<String> {
        self.languages.clone()
    }
}
