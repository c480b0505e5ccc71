//! Analyzer engine
//!
//! Runs the applicable recognizers over a text, raises scores using context,
//! removes duplicates and applies the score threshold.

use crate::config::AnalyzerConfig;
use crate::context::{ContextAwareEnhancer, LemmaContextAwareEnhancer};
use crate::dedup::remove_duplicates;
use crate::nlp::{NlpArtifacts, NlpEngine, SimpleNlpEngine};
use crate::recognizer::{RecognizerDescriptor, RegisteredRecognizer};
use crate::registry::RecognizerRegistry;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, trace};
use veil_core::{AnalysisExplanation, Error, RecognizerResult, Result};
use veil_observability::PipelineMetrics;

/// One analyze call
#[derive(Debug, Clone, Default)]
pub struct AnalyzeRequest {
    pub text: String,
    pub language: String,
    /// Entity types to look for; mutually exclusive with `all_fields`
    pub entities: Option<Vec<String>>,
    pub all_fields: bool,
    /// Overrides the engine's default threshold
    pub score_threshold: Option<f64>,
    /// Keep analysis explanations on the returned results
    pub return_decision_process: bool,
    /// Extra context words, applied to every result
    pub context: Vec<String>,
    /// Recognizers used for this request only
    pub ad_hoc_recognizers: Vec<RegisteredRecognizer>,
    pub correlation_id: Option<String>,
}

impl AnalyzeRequest {
    /// Request every supported entity type in `text`
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
            all_fields: true,
            ..Default::default()
        }
    }

    /// Restrict the request to `entities`; an empty list means all fields
    pub fn entities<I, S>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entities: Vec<String> = entities.into_iter().map(Into::into).collect();
        self.all_fields = entities.is_empty();
        self.entities = Some(entities);
        self
    }

    pub fn all_fields(mut self, all_fields: bool) -> Self {
        self.all_fields = all_fields;
        self
    }

    pub fn score_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    pub fn return_decision_process(mut self, enabled: bool) -> Self {
        self.return_decision_process = enabled;
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

    pub fn ad_hoc_recognizer(mut self, recognizer: RegisteredRecognizer) -> Self {
        self.ad_hoc_recognizers.push(recognizer);
        self
    }

    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Same settings, different text
    fn with_text(&self, text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..self.clone()
        }
    }
}

pub struct AnalyzerEngine {
    registry: Arc<RecognizerRegistry>,
    nlp_engine: Arc<dyn NlpEngine>,
    context_enhancer: Arc<dyn ContextAwareEnhancer>,
    config: AnalyzerConfig,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl AnalyzerEngine {
    /// # Errors
    /// - `Error::InvalidConfiguration` if the NLP engine or registry lacks a configured language
    pub fn new(
        registry: Arc<RecognizerRegistry>,
        nlp_engine: Arc<dyn NlpEngine>,
        config: AnalyzerConfig,
    ) -> Result<Self> {
        config.validate()?;

        let nlp_languages = nlp_engine.supported_languages();
        for language in &config.supported_languages {
            if !nlp_languages.contains(language) {
                error!(language = %language, "NLP engine does not support configured language");
                return Err(Error::InvalidConfiguration(format!(
                    "NLP engine does not support language '{}'",
                    language
                )));
            }
            if !registry.supported_languages().contains(language) {
                error!(language = %language, "Registry does not support configured language");
                return Err(Error::InvalidConfiguration(format!(
                    "Recognizer registry does not support language '{}'",
                    language
                )));
            }
        }

        Ok(Self {
            registry,
            nlp_engine,
            context_enhancer: Arc::new(LemmaContextAwareEnhancer::new(&config.context)),
            config,
            metrics: None,
        })
    }

    /// Predefined recognizers and the rule-based NLP engine
    pub fn from_config(config: AnalyzerConfig) -> Result<Self> {
        let registry = RecognizerRegistry::new(config.supported_languages.iter().cloned())
            .with_regex_flags(config.regex_flags);
        registry.load_predefined_recognizers(None)?;
        let nlp_engine = SimpleNlpEngine::new().with_languages(config.supported_languages.iter().cloned());
        Self::new(Arc::new(registry), Arc::new(nlp_engine), config)
    }

    pub fn with_context_enhancer(mut self, enhancer: Arc<dyn ContextAwareEnhancer>) -> Self {
        self.context_enhancer = enhancer;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &Arc<RecognizerRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Find PII spans in `request.text`
    ///
    /// Any recognizer error fails the whole request.
    pub fn analyze(&self, request: &AnalyzeRequest) -> Result<Vec<RecognizerResult>> {
        let started = Instant::now();
        let language = request.language.as_str();
        let correlation_id = request.correlation_id.as_deref().unwrap_or("-");

        if !self.config.supported_languages.iter().any(|l| l == language) {
            return Err(Error::InvalidRequest(format!(
                "Language '{}' is not supported, expected one of {:?}",
                language, self.config.supported_languages
            )));
        }
        let threshold = request
            .score_threshold
            .unwrap_or(self.config.default_score_threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::InvalidRequest(format!(
                "score_threshold {} is outside [0, 1]",
                threshold
            )));
        }

        let recognizers = self.registry.get_recognizers(
            language,
            request.entities.as_deref(),
            request.all_fields,
            &request.ad_hoc_recognizers,
        )?;

        let nlp_artifacts = self.nlp_engine.process_text(&request.text, language)?;

        let raw_results = self.run_recognizers(request, &recognizers, &nlp_artifacts)?;
        debug!(
            correlation_id,
            recognizers = recognizers.len(),
            raw_results = raw_results.len(),
            "Recognizers finished"
        );

        let enhanced = self.context_enhancer.enhance_using_context(
            &request.text,
            &raw_results,
            &nlp_artifacts,
            &recognizers,
            &request.context,
        )?;

        let mut results: Vec<RecognizerResult> = remove_duplicates(enhanced)
            .into_iter()
            .filter(|r| r.score >= threshold)
            .collect();

        if !request.return_decision_process {
            for result in &mut results {
                result.analysis_explanation = None;
            }
        }

        for result in &results {
            trace!(
                correlation_id,
                entity_type = %result.entity_type,
                start = result.start,
                end = result.end,
                score = result.score,
                text = result.text_in(&request.text).unwrap_or_default(),
                "Accepted result"
            );
        }

        let elapsed = started.elapsed();
        if let Some(metrics) = &self.metrics {
            metrics.record_analyze(
                language,
                elapsed.as_secs_f64(),
                results.iter().map(|r| r.entity_type.as_str()),
            );
        }
        debug!(
            correlation_id,
            language,
            results = results.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Analyze completed"
        );

        Ok(results)
    }

    /// Analyze each text with the same settings
    pub fn analyze_batch<S: AsRef<str>>(
        &self,
        texts: &[S],
        template: &AnalyzeRequest,
    ) -> Result<Vec<Vec<RecognizerResult>>> {
        texts
            .iter()
            .map(|text| self.analyze(&template.with_text(text.as_ref())))
            .collect()
    }

    fn run_recognizers(
        &self,
        request: &AnalyzeRequest,
        recognizers: &[RegisteredRecognizer],
        nlp_artifacts: &NlpArtifacts,
    ) -> Result<Vec<RecognizerResult>> {
        let run = |recognizer: &RegisteredRecognizer| -> Result<Vec<RecognizerResult>> {
            let entities = match request.entities.as_deref() {
                Some(entities) if !entities.is_empty() => entities,
                _ => recognizer.supported_entities(),
            };
            let mut results = recognizer.analyze(&request.text, entities, Some(nlp_artifacts))?;
            results.retain(|r| entities.contains(&r.entity_type));
            for result in &mut results {
                stamp_result(result, recognizer);
            }
            if let Some(metrics) = &self.metrics {
                metrics.record_recognizer_results(recognizer.name(), results.len());
            }
            Ok(results)
        };

        let per_recognizer: Vec<Vec<RecognizerResult>> = if self.config.parallel {
            recognizers.par_iter().map(run).collect::<Result<_>>()?
        } else {
            recognizers.iter().map(run).collect::<Result<_>>()?
        };

        Ok(per_recognizer.into_iter().flatten().collect())
    }

    /// Entity types supported for `language` (every language when `None`)
    pub fn get_supported_entities(&self, language: Option<&str>) -> Vec<String> {
        match language {
            Some(language) => {
                let languages = [language.to_string()];
                self.registry.get_supported_entities(Some(&languages[..]))
            }
            None => self.registry.get_supported_entities(None),
        }
    }

    /// Descriptors of the registered recognizers for `language` (all when `None`)
    pub fn get_recognizers(&self, language: Option<&str>) -> Vec<RecognizerDescriptor> {
        self.registry
            .recognizers()
            .iter()
            .filter(|r| language.is_none_or(|l| r.supported_language() == l))
            .map(|r| r.descriptor())
            .collect()
    }
}

/// Make sure the context enhancer can trace a result to its recognizer
fn stamp_result(result: &mut RecognizerResult, recognizer: &RegisteredRecognizer) {
    if result.recognition_metadata.recognizer_identifier.is_empty() {
        result.recognition_metadata = recognizer.recognition_metadata();
    }
    if result.analysis_explanation.is_none() {
        result.analysis_explanation = Some(AnalysisExplanation::new(recognizer.name(), result.score));
    }
}

impl std::fmt::Debug for AnalyzerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerEngine")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests;
