//! Shared fixtures for the end-to-end tests

#![allow(dead_code)]

use std::sync::Arc;
use veil_analyzer::{AnalyzerConfig, AnalyzerEngine, RecognizerRegistry, SimpleNlpEngine};

pub const LICENSE_TEXT: &str = "John Smith drivers license is AC432223";

pub fn nlp_engine() -> SimpleNlpEngine {
    SimpleNlpEngine::new()
        .with_languages(["en"])
        .with_entity_phrase("PERSON", "John Smith")
        .unwrap()
}

pub fn analyzer_with(registry: RecognizerRegistry) -> AnalyzerEngine {
    AnalyzerEngine::new(
        Arc::new(registry),
        Arc::new(nlp_engine()),
        AnalyzerConfig::default(),
    )
    .unwrap()
}

pub fn analyzer() -> AnalyzerEngine {
    analyzer_with(RecognizerRegistry::with_predefined(["en"]).unwrap())
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("veil_analyzer=debug,veil_anonymizer=debug")
        .with_test_writer()
        .try_init();
}
