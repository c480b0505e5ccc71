//! Veil Analyzer
//!
//! This crate finds PII spans in free text:
//! - Pattern recognizers (regex, deny lists, checksum validation)
//! - NLP-backed recognizers for coarse entity types
//! - Context-word score enhancement
//! - A recognizer registry and the analyzer engine that orchestrates them

pub mod config;
pub mod context;
pub mod dedup;
pub mod engine;
pub mod nlp;
pub mod pattern;
pub mod predefined;
pub mod recognizer;
pub mod registry;
pub mod validators;

pub use config::{AnalyzerConfig, ContextConfig, LoggingConfig};
pub use context::{ContextAwareEnhancer, ContextMatchMode, LemmaContextAwareEnhancer};
pub use dedup::remove_duplicates;
pub use engine::{AnalyzeRequest, AnalyzerEngine};
pub use nlp::{NlpArtifacts, NlpEngine, NlpEntity, SimpleNlpEngine};
pub use pattern::{
    Pattern, PatternRecognizer, PatternRecognizerBuilder, PatternValidator, RegexFlags,
};
pub use recognizer::{EntityRecognizer, NlpRecognizer, RecognizerDescriptor, RegisteredRecognizer};
pub use registry::{FileRecognizerStore, RecognizerRegistry, RecognizerStore, RegistryConfig};

pub use veil_core::{AnalysisExplanation, Error, RecognitionMetadata, RecognizerResult, Result};
