//! Regex and deny-list recognizer with checksum hooks

use crate::dedup::remove_duplicates;
use crate::nlp::NlpArtifacts;
use crate::pattern::{Pattern, PatternValidator, RegexFlags, validate_score};
use crate::recognizer::{EntityRecognizer, next_recognizer_id};
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};
use veil_core::{AnalysisExplanation, Error, RecognizerResult, Result};

const MAX_SCORE: f64 = 1.0;
const MIN_SCORE: f64 = 0.0;
const DENY_LIST_PATTERN_NAME: &str = "deny_list";

struct CompiledPattern {
    pattern: Pattern,
    regex: Regex,
}

struct DenyList {
    words: Vec<String>,
    /// Finds the leftmost position where any word matches
    scanner: Regex,
    /// One regex per word anchored at the candidate start, in declaration order
    anchored: Vec<Regex>,
    /// Alternation form of the list, reported in explanations
    source: String,
}

impl DenyList {
    fn new(words: Vec<String>, flags: RegexFlags) -> Result<Self> {
        let compile = |pattern: &str| {
            flags
                .compile(pattern)
                .map_err(|e| Error::InvalidConfiguration(format!("Invalid deny list: {}", e)))
        };
        let escaped: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
        let alternation = escaped.join("|");

        let scanner = compile(&format!("(?:{})", alternation))?;
        let anchored = escaped
            .iter()
            .map(|word| compile(&format!(r"\A(?:{})", word)))
            .collect::<Result<Vec<_>>>()?;
        let source = format!("(?:^|(?<=\\W))({})(?:(?=\\W)|$)", alternation);

        Ok(Self {
            words,
            scanner,
            anchored,
            source,
        })
    }

    /// Hits delimited by non-word characters or the text edges
    ///
    /// At each candidate start the words are tried in declaration order and
    /// the first one followed by a delimiter wins. A start with no such word
    /// is skipped one character at a time.
    fn find_all(&self, text: &str) -> Vec<(usize, usize)> {
        let mut hits = Vec::new();
        let mut pos = 0;
        while pos < text.len() {
            let Some(candidate) = self.scanner.find_at(text, pos) else {
                break;
            };
            let start = candidate.start();
            let delimited_before = !text[..start].chars().next_back().is_some_and(is_word_char);
            let end = if delimited_before {
                self.delimited_end(text, start)
            } else {
                None
            };

            match end {
                Some(end) if end > start => {
                    hits.push((start, end));
                    pos = end;
                }
                _ => pos = start + text[start..].chars().next().map_or(1, char::len_utf8),
            }
        }
        hits
    }

    fn delimited_end(&self, text: &str, start: usize) -> Option<usize> {
        let rest = &text[start..];
        self.anchored
            .iter()
            .filter_map(|word| word.find(rest))
            .map(|m| start + m.end())
            .find(|&end| !text[end..].chars().next().is_some_and(is_word_char))
    }
}

/// The pattern (or deny list) a match came from
struct MatchSource<'a> {
    name: &'a str,
    regex: &'a str,
    score: f64,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Recognizes one entity type using regex patterns and/or a deny list
pub struct PatternRecognizer {
    id: String,
    name: String,
    supported_entities: Vec<String>,
    supported_language: String,
    version: String,
    context: Vec<String>,
    patterns: Vec<CompiledPattern>,
    deny_list: Option<DenyList>,
    validator: Option<Arc<dyn PatternValidator>>,
}

impl PatternRecognizer {
    pub fn builder(supported_entity: impl Into<String>) -> PatternRecognizerBuilder {
        PatternRecognizerBuilder::new(supported_entity)
    }

    pub fn supported_entity(&self) -> &str {
        &self.supported_entities[0]
    }

    /// Patterns in evaluation order (descending score)
    pub fn patterns(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter().map(|p| &p.pattern)
    }

    pub fn deny_list(&self) -> &[String] {
        self.deny_list.as_ref().map(|d| d.words.as_slice()).unwrap_or(&[])
    }

    fn score_match(&self, matched: &str, base_score: f64) -> (f64, Option<bool>) {
        let Some(validator) = &self.validator else {
            return (base_score, None);
        };

        let validation_result = validator.validate_result(matched);
        let mut score = match validation_result {
            Some(true) => MAX_SCORE,
            Some(false) => MIN_SCORE,
            None => base_score,
        };
        if validator.invalidate_result(matched) == Some(true) {
            score = MIN_SCORE;
        }
        (score, validation_result)
    }

    fn build_result(
        &self,
        (start, end): (usize, usize),
        score: f64,
        source: MatchSource<'_>,
        validation_result: Option<bool>,
    ) -> RecognizerResult {
        let mut explanation = AnalysisExplanation::new(self.name.clone(), source.score)
            .with_pattern(source.name, source.regex)
            .with_textual_explanation(format!(
                "Detected by `{}` using pattern `{}`",
                self.name, source.name
            ));
        explanation.validation_result = validation_result;
        explanation.score = score;

        RecognizerResult::new(self.supported_entity(), start, end, score)
            .with_explanation(explanation)
            .with_metadata(self.recognition_metadata())
    }

    fn analyze_patterns(&self, text: &str, results: &mut Vec<RecognizerResult>) {
        for compiled in &self.patterns {
            let pattern = &compiled.pattern;
            let before = results.len();

            for m in compiled.regex.find_iter(text) {
                if m.is_empty() {
                    continue;
                }
                let (score, validation_result) = self.score_match(m.as_str(), pattern.score);
                if score <= MIN_SCORE {
                    continue;
                }
                let source = MatchSource {
                    name: &pattern.name,
                    regex: &pattern.regex,
                    score: pattern.score,
                };
                results.push(self.build_result(
                    (m.start(), m.end()),
                    score,
                    source,
                    validation_result,
                ));
            }

            debug!(
                recognizer = %self.name,
                pattern = %pattern.name,
                matches = results.len() - before,
                "Pattern evaluated"
            );
        }
    }

    fn analyze_deny_list(&self, text: &str, results: &mut Vec<RecognizerResult>) {
        let Some(deny_list) = &self.deny_list else {
            return;
        };

        for (start, end) in deny_list.find_all(text) {
            let (score, validation_result) = self.score_match(&text[start..end], MAX_SCORE);
            if score <= MIN_SCORE {
                continue;
            }
            let source = MatchSource {
                name: DENY_LIST_PATTERN_NAME,
                regex: &deny_list.source,
                score: MAX_SCORE,
            };
            results.push(self.build_result((start, end), score, source, validation_result));
        }
    }
}

impl EntityRecognizer for PatternRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn supported_entities(&self) -> &[String] {
        &self.supported_entities
    }

    fn supported_language(&self) -> &str {
        &self.supported_language
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn context(&self) -> &[String] {
        &self.context
    }

    fn analyze(
        &self,
        text: &str,
        entities: &[String],
        _nlp_artifacts: Option<&NlpArtifacts>,
    ) -> Result<Vec<RecognizerResult>> {
        if !entities.is_empty() && !entities.iter().any(|e| e == self.supported_entity()) {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        self.analyze_patterns(text, &mut results);
        self.analyze_deny_list(text, &mut results);

        Ok(remove_duplicates(results))
    }
}

impl fmt::Debug for PatternRecognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternRecognizer")
            .field("name", &self.name)
            .field("supported_entity", &self.supported_entity())
            .field("supported_language", &self.supported_language)
            .field("patterns", &self.patterns.len())
            .field("deny_list", &self.deny_list().len())
            .finish()
    }
}

/// Builder for [`PatternRecognizer`]; all validation happens in [`build`](Self::build)
pub struct PatternRecognizerBuilder {
    supported_entity: String,
    name: Option<String>,
    supported_language: String,
    version: String,
    patterns: Vec<Pattern>,
    deny_list: Vec<String>,
    context: Vec<String>,
    regex_flags: RegexFlags,
    validator: Option<Arc<dyn PatternValidator>>,
}

impl PatternRecognizerBuilder {
    fn new(supported_entity: impl Into<String>) -> Self {
        Self {
            supported_entity: supported_entity.into(),
            name: None,
            supported_language: "en".to_string(),
            version: "0.0.1".to_string(),
            patterns: Vec::new(),
            deny_list: Vec::new(),
            context: Vec::new(),
            regex_flags: RegexFlags::default(),
            validator: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.supported_language = language.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn patterns(mut self, patterns: impl IntoIterator<Item = Pattern>) -> Self {
        self.patterns.extend(patterns);
        self
    }

    pub fn deny_list<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deny_list.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn context<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context.extend(words.into_iter().map(Into::into));
        self
    }

    /// Drop context words added so far
    pub fn clear_context(mut self) -> Self {
        self.context.clear();
        self
    }

    pub fn regex_flags(mut self, flags: RegexFlags) -> Self {
        self.regex_flags = flags;
        self
    }

    pub fn validator(mut self, validator: impl PatternValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn build(mut self) -> Result<PatternRecognizer> {
        self.deny_list.retain(|word| !word.is_empty());
        if self.supported_entity.trim().is_empty() {
            return Err(Error::InvalidConfiguration(
                "Pattern recognizer requires a supported entity".to_string(),
            ));
        }
        if self.patterns.is_empty() && self.deny_list.is_empty() {
            error!(
                entity = %self.supported_entity,
                "Pattern recognizer has neither patterns nor a deny list"
            );
            return Err(Error::InvalidConfiguration(format!(
                "Pattern recognizer for '{}' should be initialized with patterns or with a deny list",
                self.supported_entity
            )));
        }

        let mut patterns = self.patterns;
        // Stable, so equal scores keep declaration order
        patterns.sort_by(|a, b| b.score.total_cmp(&a.score));

        let compiled = patterns
            .into_iter()
            .map(|pattern| {
                validate_score(&pattern.name, pattern.score)?;
                let regex = self.regex_flags.compile(&pattern.regex).map_err(|e| {
                    Error::InvalidConfiguration(format!(
                        "Invalid regex in pattern '{}': {}",
                        pattern.name, e
                    ))
                })?;
                Ok(CompiledPattern { pattern, regex })
            })
            .collect::<Result<Vec<_>>>()?;

        let deny_list = if self.deny_list.is_empty() {
            None
        } else {
            Some(DenyList::new(self.deny_list, self.regex_flags)?)
        };

        let name = self
            .name
            .unwrap_or_else(|| format!("{}_recognizer", self.supported_entity.to_lowercase()));

        Ok(PatternRecognizer {
            id: next_recognizer_id(&name),
            name,
            supported_entities: vec![self.supported_entity],
            supported_language: self.supported_language,
            version: self.version,
            context: self.context,
            patterns: compiled,
            deny_list,
            validator: self.validator,
        })
    }
}
