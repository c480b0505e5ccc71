//! End-to-end tests: analyze, then anonymize, then deanonymize
//!
//! Analyzer → conflict resolution → operators → edit log

mod common;

use common::{LICENSE_TEXT, analyzer, init_tracing};
use std::collections::HashMap;
use std::sync::Arc;
use veil_analyzer::AnalyzeRequest;
use veil_anonymizer::{
    AnonymizerEngine, DEFAULT, DeanonymizeEngine, Error, OperatorConfig, RecognizerResult,
};
use veil_observability::PipelineMetrics;

fn operators(entries: Vec<(&str, OperatorConfig)>) -> HashMap<String, OperatorConfig> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[test]
fn test_e2e_person_and_license() {
    init_tracing();
    let results = analyzer()
        .analyze(&AnalyzeRequest::new(LICENSE_TEXT, "en"))
        .unwrap();

    let found: Vec<_> = results
        .iter()
        .map(|r| (r.entity_type.as_str(), r.start, r.end))
        .collect();
    assert_eq!(
        found,
        vec![("PERSON", 0, 10), ("US_DRIVER_LICENSE", 30, 38)]
    );

    let anonymized = AnonymizerEngine::new()
        .anonymize(
            LICENSE_TEXT,
            &results,
            &operators(vec![
                ("PERSON", OperatorConfig::replace("<PERSON>")),
                ("US_DRIVER_LICENSE", OperatorConfig::mask('*', 4, true)),
            ]),
        )
        .unwrap();

    assert_eq!(anonymized.text, "<PERSON> drivers license is AC43****");
    assert_eq!(anonymized.items.len(), 2);
    assert_eq!(anonymized.items[0].entity_type, "US_DRIVER_LICENSE");
}

#[test]
fn test_e2e_overlapping_names() {
    let text = "hello world, my name is Jane Doe. My number is: 034453334";
    let results = vec![
        RecognizerResult::new("FULL_NAME", 24, 32, 0.6),
        RecognizerResult::new("FIRST_NAME", 24, 28, 0.9),
        RecognizerResult::new("LAST_NAME", 29, 33, 0.6),
        RecognizerResult::new("NAME", 24, 30, 0.8),
    ];

    let anonymized = AnonymizerEngine::new()
        .anonymize(text, &results, &HashMap::new())
        .unwrap();

    assert_eq!(
        anonymized.text,
        "hello world, my name is <FULL_NAME><LAST_NAME> My number is: 034453334"
    );
}

#[test]
fn test_e2e_unknown_operator_leaves_no_output() {
    let results = analyzer()
        .analyze(&AnalyzeRequest::new(LICENSE_TEXT, "en"))
        .unwrap();

    let err = AnonymizerEngine::new()
        .anonymize(
            LICENSE_TEXT,
            &results,
            &operators(vec![(DEFAULT, OperatorConfig::new("shuffle"))]),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperator(_)));
}

#[test]
fn test_e2e_encrypt_round_trip() {
    let text = "Card 4111 1111 1111 1111 belongs to John Smith, mail john@example.com";
    let results = analyzer()
        .analyze(&AnalyzeRequest::new(text, "en").entities([
            "CREDIT_CARD",
            "PERSON",
            "EMAIL_ADDRESS",
        ]))
        .unwrap();
    let mut types: Vec<_> = results.iter().map(|r| r.entity_type.as_str()).collect();
    types.sort_unstable();
    assert_eq!(types, vec!["CREDIT_CARD", "EMAIL_ADDRESS", "PERSON"]);

    let key = "3t6w9z$C&F)J@NcRfUjXn2r5u8x/A%D*";
    let anonymized = AnonymizerEngine::new()
        .anonymize(
            text,
            &results,
            &operators(vec![
                (DEFAULT, OperatorConfig::encrypt(key)),
                ("PERSON", OperatorConfig::keep()),
            ]),
        )
        .unwrap();
    assert!(anonymized.text.contains("John Smith"));
    assert!(!anonymized.text.contains("4111"));
    assert!(!anonymized.text.contains("john@example.com"));

    let encrypted: Vec<_> = anonymized
        .output_entities()
        .into_iter()
        .filter(|e| e.operator == "encrypt")
        .collect();
    assert_eq!(encrypted.len(), 2);

    let restored = DeanonymizeEngine::new()
        .deanonymize(
            &anonymized.text,
            &encrypted,
            &operators(vec![(DEFAULT, OperatorConfig::decrypt(key))]),
        )
        .unwrap();
    assert_eq!(restored.text, text);
}

#[test]
fn test_e2e_hash_is_stable_with_salt() {
    let results = analyzer()
        .analyze(&AnalyzeRequest::new(LICENSE_TEXT, "en").entities(["PERSON"]))
        .unwrap();
    let config = operators(vec![(DEFAULT, OperatorConfig::hash_with_salt("sha256", "pepper"))]);
    let engine = AnonymizerEngine::new();

    let first = engine.anonymize(LICENSE_TEXT, &results, &config).unwrap();
    let second = engine.anonymize(LICENSE_TEXT, &results, &config).unwrap();
    assert_eq!(first.text, second.text);
    assert_eq!(first.items[0].text.len(), 64);
    assert!(first.text.ends_with(" drivers license is AC432223"));
}

#[test]
fn test_e2e_metrics_shared_across_engines() {
    let metrics = Arc::new(PipelineMetrics::new().unwrap());
    let analyzer = analyzer().with_metrics(Arc::clone(&metrics));
    let anonymizer = AnonymizerEngine::new().with_metrics(Arc::clone(&metrics));

    let results = analyzer
        .analyze(&AnalyzeRequest::new(LICENSE_TEXT, "en"))
        .unwrap();
    anonymizer
        .anonymize(LICENSE_TEXT, &results, &HashMap::new())
        .unwrap();

    let families = metrics.registry().gather();
    let names: Vec<_> = families.iter().map(|f| f.name().to_string()).collect();
    assert!(names.iter().any(|n| n == "veil_analyze_requests_total"));
    assert!(names.iter().any(|n| n == "veil_anonymize_requests_total"));
    assert_eq!(metrics.anonymize_requests_total.get(), 1);
}

#[test]
fn test_e2e_results_serialize() {
    let results = analyzer()
        .analyze(&AnalyzeRequest::new(LICENSE_TEXT, "en").return_decision_process(true))
        .unwrap();
    let json = serde_json::to_value(&results).unwrap();
    assert_eq!(json[1]["entity_type"], "US_DRIVER_LICENSE");
    assert_eq!(
        json[1]["analysis_explanation"]["supportive_context_word"],
        "license"
    );

    let anonymized = AnonymizerEngine::new()
        .anonymize(LICENSE_TEXT, &results, &HashMap::new())
        .unwrap();
    let json = serde_json::to_value(&anonymized).unwrap();
    assert_eq!(json["items"][0]["operator"], "replace");
}
