use super::*;
use crate::pattern::{Pattern, PatternRecognizer, RegexFlags};
use crate::recognizer::EntityRecognizer;
use std::sync::atomic::{AtomicUsize, Ordering};

const LICENSE_TEXT: &str = "John Smith drivers license is AC432223";

fn engine_with(config: AnalyzerConfig) -> AnalyzerEngine {
    let registry = RecognizerRegistry::with_predefined(["en"]).unwrap();
    let nlp_engine = SimpleNlpEngine::new()
        .with_languages(["en"])
        .with_entity_phrase("PERSON", "John Smith")
        .unwrap();
    AnalyzerEngine::new(Arc::new(registry), Arc::new(nlp_engine), config).unwrap()
}

fn engine() -> AnalyzerEngine {
    engine_with(AnalyzerConfig::default())
}

fn spans(results: &[RecognizerResult]) -> Vec<(&str, usize, usize)> {
    results
        .iter()
        .map(|r| (r.entity_type.as_str(), r.start, r.end))
        .collect()
}

#[test]
fn test_person_and_license() {
    let results = engine().analyze(&AnalyzeRequest::new(LICENSE_TEXT, "en")).unwrap();

    assert_eq!(
        spans(&results),
        vec![("PERSON", 0, 10), ("US_DRIVER_LICENSE", 30, 38)]
    );
    assert!((results[0].score - 0.85).abs() < 1e-9);
    assert!((results[1].score - 0.65).abs() < 1e-9);
    assert!(results.iter().all(|r| r.analysis_explanation.is_none()));
}

#[test]
fn test_decision_process() {
    let request = AnalyzeRequest::new(LICENSE_TEXT, "en").return_decision_process(true);
    let results = engine().analyze(&request).unwrap();

    let license = results
        .iter()
        .find(|r| r.entity_type == "US_DRIVER_LICENSE")
        .unwrap();
    let explanation = license.analysis_explanation.as_ref().unwrap();
    assert_eq!(explanation.recognizer, "UsLicenseRecognizer");
    assert_eq!(explanation.original_score, 0.3);
    assert_eq!(explanation.supportive_context_word, "license");
    assert!(license.recognition_metadata.is_score_enhanced_by_context);
}

#[test]
fn test_threshold_is_inclusive() {
    let engine = engine();

    let kept = engine
        .analyze(&AnalyzeRequest::new(LICENSE_TEXT, "en").score_threshold(0.65))
        .unwrap();
    assert_eq!(kept.len(), 2);

    let dropped = engine
        .analyze(&AnalyzeRequest::new(LICENSE_TEXT, "en").score_threshold(0.66))
        .unwrap();
    assert_eq!(spans(&dropped), vec![("PERSON", 0, 10)]);
}

#[test]
fn test_default_threshold_from_config() {
    let engine = engine_with(AnalyzerConfig {
        default_score_threshold: 0.9,
        ..Default::default()
    });
    let results = engine.analyze(&AnalyzeRequest::new(LICENSE_TEXT, "en")).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_requested_entities_only() {
    let request = AnalyzeRequest::new(LICENSE_TEXT, "en").entities(["PERSON"]);
    let results = engine().analyze(&request).unwrap();
    assert_eq!(spans(&results), vec![("PERSON", 0, 10)]);
}

#[test]
fn test_empty_entities_mean_all_fields() {
    let request = AnalyzeRequest::new(LICENSE_TEXT, "en").entities(Vec::<String>::new());
    assert!(request.all_fields);
    let results = engine().analyze(&request).unwrap();
    assert_eq!(
        spans(&results),
        vec![("PERSON", 0, 10), ("US_DRIVER_LICENSE", 30, 38)]
    );

    let explicit = AnalyzeRequest {
        entities: Some(Vec::new()),
        all_fields: false,
        ..AnalyzeRequest::new(LICENSE_TEXT, "en")
    };
    assert_eq!(engine().analyze(&explicit).unwrap().len(), 2);
}

#[test]
fn test_from_config_applies_regex_flags() {
    let text = "write to jane@example.com";
    let request = AnalyzeRequest::new(text, "en").entities(["EMAIL_ADDRESS"]);

    let default = AnalyzerEngine::from_config(AnalyzerConfig::default()).unwrap();
    assert_eq!(default.analyze(&request).unwrap().len(), 1);

    let case_sensitive = AnalyzerEngine::from_config(AnalyzerConfig {
        regex_flags: RegexFlags {
            case_insensitive: false,
            ..RegexFlags::default()
        },
        ..Default::default()
    })
    .unwrap();
    assert_eq!(
        case_sensitive.registry().global_regex_flags(),
        RegexFlags {
            case_insensitive: false,
            ..RegexFlags::default()
        }
    );
    assert!(case_sensitive.analyze(&request).unwrap().is_empty());
}

#[test]
fn test_request_errors() {
    let engine = engine();

    let err = engine
        .analyze(&AnalyzeRequest::new(LICENSE_TEXT, "fr"))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    let contradictory = AnalyzeRequest::new(LICENSE_TEXT, "en")
        .entities(["PERSON"])
        .all_fields(true);
    let err = engine.analyze(&contradictory).unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    let err = engine
        .analyze(&AnalyzeRequest::new(LICENSE_TEXT, "en").score_threshold(1.5))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    let err = engine
        .analyze(&AnalyzeRequest::new(LICENSE_TEXT, "en").entities(["NOT_A_TYPE"]))
        .unwrap_err();
    assert!(matches!(err, Error::NoRecognizersFound { .. }));
}

#[test]
fn test_empty_text() {
    let results = engine().analyze(&AnalyzeRequest::new("", "en")).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_ad_hoc_recognizer() {
    let zip = PatternRecognizer::builder("ZIP")
        .pattern(Pattern::new("zip", r"\b\d{5}\b", 0.4))
        .context(["zip"])
        .build()
        .unwrap();
    let text = "zip 90210";
    let engine = engine();

    let request = AnalyzeRequest::new(text, "en").ad_hoc_recognizer(RegisteredRecognizer::new(zip));
    let results = engine.analyze(&request).unwrap();
    assert_eq!(spans(&results), vec![("ZIP", 4, 9)]);
    assert!((results[0].score - 0.75).abs() < 1e-9);

    // Not kept after the request
    let results = engine.analyze(&AnalyzeRequest::new(text, "en")).unwrap();
    assert!(results.iter().all(|r| r.entity_type != "ZIP"));
}

#[test]
fn test_request_context_words() {
    let text = "my number is AC432223";
    let engine = engine();

    let plain = engine.analyze(&AnalyzeRequest::new(text, "en")).unwrap();
    assert_eq!(plain[0].score, 0.3);

    let with_context = engine
        .analyze(&AnalyzeRequest::new(text, "en").context(["driving"]))
        .unwrap();
    assert!((with_context[0].score - 0.65).abs() < 1e-9);
}

struct FailingRecognizer {
    entities: Vec<String>,
}

impl EntityRecognizer for FailingRecognizer {
    fn name(&self) -> &str {
        "FailingRecognizer"
    }

    fn id(&self) -> &str {
        "failing_1"
    }

    fn supported_entities(&self) -> &[String] {
        &self.entities
    }

    fn supported_language(&self) -> &str {
        "en"
    }

    fn analyze(
        &self,
        _text: &str,
        _entities: &[String],
        _nlp_artifacts: Option<&NlpArtifacts>,
    ) -> Result<Vec<RecognizerResult>> {
        Err(Error::Nlp("model crashed".to_string()))
    }
}

#[test]
fn test_recognizer_error_fails_request() {
    let engine = engine();
    engine.registry().add_recognizer(RegisteredRecognizer::new(FailingRecognizer {
        entities: vec!["BROKEN".to_string()],
    }));

    for parallel in [false, true] {
        let engine = AnalyzerEngine::new(
            Arc::clone(engine.registry()),
            Arc::new(SimpleNlpEngine::new()),
            AnalyzerConfig {
                parallel,
                ..Default::default()
            },
        )
        .unwrap();
        let err = engine
            .analyze(&AnalyzeRequest::new(LICENSE_TEXT, "en"))
            .unwrap_err();
        assert!(matches!(err, Error::Nlp(_)));
    }
}

/// Returns bare results and counts loads
struct BadgeRecognizer {
    entities: Vec<String>,
    context: Vec<String>,
    loads: AtomicUsize,
}

impl BadgeRecognizer {
    fn new() -> Self {
        Self {
            entities: vec!["BADGE".to_string()],
            context: vec!["badge".to_string()],
            loads: AtomicUsize::new(0),
        }
    }
}

impl EntityRecognizer for BadgeRecognizer {
    fn name(&self) -> &str {
        "BadgeRecognizer"
    }

    fn id(&self) -> &str {
        "badge_1"
    }

    fn supported_entities(&self) -> &[String] {
        &self.entities
    }

    fn supported_language(&self) -> &str {
        "en"
    }

    fn context(&self) -> &[String] {
        &self.context
    }

    fn load(&self) -> Result<()> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn analyze(
        &self,
        text: &str,
        _entities: &[String],
        _nlp_artifacts: Option<&NlpArtifacts>,
    ) -> Result<Vec<RecognizerResult>> {
        Ok(text
            .match_indices("B-17")
            .map(|(start, m)| RecognizerResult::new("BADGE", start, start + m.len(), 0.5))
            .collect())
    }
}

#[test]
fn test_third_party_recognizer_is_stamped_and_loaded_once() {
    let badge = Arc::new(BadgeRecognizer::new());
    let engine = engine();
    engine
        .registry()
        .add_recognizer(RegisteredRecognizer::from_arc(badge.clone()));

    let request = AnalyzeRequest::new("badge B-17", "en")
        .entities(["BADGE"])
        .return_decision_process(true);
    let results = engine.analyze(&request).unwrap();
    engine.analyze(&request).unwrap();

    assert_eq!(badge.loads.load(Ordering::SeqCst), 1);
    assert_eq!(results[0].recognition_metadata.recognizer_name, "BadgeRecognizer");
    assert!((results[0].score - 0.85).abs() < 1e-9);
    assert_eq!(
        results[0].analysis_explanation.as_ref().unwrap().recognizer,
        "BadgeRecognizer"
    );
}

#[test]
fn test_parallel_matches_sequential() {
    let text = "Card 4012888888881881, mail john@example.com, ip 192.168.0.1, license AC432223";
    let sequential = engine().analyze(&AnalyzeRequest::new(text, "en")).unwrap();
    let parallel = engine_with(AnalyzerConfig {
        parallel: true,
        ..Default::default()
    })
    .analyze(&AnalyzeRequest::new(text, "en"))
    .unwrap();

    assert_eq!(spans(&sequential), spans(&parallel));
    let types: Vec<_> = sequential.iter().map(|r| r.entity_type.as_str()).collect();
    assert!(types.contains(&"CREDIT_CARD"));
    assert!(types.contains(&"EMAIL_ADDRESS"));
    assert!(types.contains(&"IP_ADDRESS"));
}

#[test]
fn test_analyze_batch() {
    let template = AnalyzeRequest::new("", "en").entities(["EMAIL_ADDRESS"]);
    let batch = engine()
        .analyze_batch(&["write to a@b.io", "nothing here"], &template)
        .unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(spans(&batch[0]), vec![("EMAIL_ADDRESS", 9, 15)]);
    assert!(batch[1].is_empty());
}

#[test]
fn test_supported_entities_and_recognizers() {
    let engine = engine();
    let entities = engine.get_supported_entities(Some("en"));
    assert!(entities.contains(&"US_SSN".to_string()));
    assert!(entities.contains(&"PERSON".to_string()));
    assert!(engine.get_supported_entities(Some("de")).is_empty());

    let descriptors = engine.get_recognizers(Some("en"));
    let license = descriptors
        .iter()
        .find(|d| d.name == "UsLicenseRecognizer")
        .unwrap();
    assert!(license.context_words.as_ref().unwrap().contains(&"license".to_string()));
}

#[test]
fn test_metrics_recorded() {
    let metrics = Arc::new(PipelineMetrics::new().unwrap());
    let engine = engine().with_metrics(Arc::clone(&metrics));
    engine.analyze(&AnalyzeRequest::new(LICENSE_TEXT, "en")).unwrap();

    let gathered = metrics.registry().gather();
    let results_total: f64 = gathered
        .iter()
        .find(|m| m.name() == "veil_analyze_results_total")
        .unwrap()
        .metric
        .iter()
        .map(|m| m.counter.as_ref().unwrap().value.unwrap())
        .sum();
    assert_eq!(results_total, 2.0);
}

#[test]
fn test_misconfigured_languages() {
    let registry = Arc::new(RecognizerRegistry::new(["en"]));
    let config = AnalyzerConfig {
        supported_languages: vec!["en".to_string(), "de".to_string()],
        ..Default::default()
    };
    let err = AnalyzerEngine::new(registry, Arc::new(SimpleNlpEngine::new()), config).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration(_)));

    let registry = Arc::new(RecognizerRegistry::new(["en", "fr"]));
    let config = AnalyzerConfig {
        supported_languages: vec!["fr".to_string()],
        ..Default::default()
    };
    let err = AnalyzerEngine::new(registry, Arc::new(SimpleNlpEngine::new()), config).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration(_)));
}
