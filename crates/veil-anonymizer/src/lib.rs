//! Veil Anonymizer
//!
//! This crate rewrites text given the spans found by the analyzer:
//! - Same-type merging and cross-type conflict resolution
//! - Operators (replace, redact, mask, hash, encrypt, keep, custom)
//! - Reverse-order rewriting with an edit log, and deanonymization

pub mod conflict;
pub mod engine;
pub mod operators;

pub use conflict::ConflictResolutionStrategy;
pub use engine::{AnonymizerEngine, DEFAULT, DeanonymizeEngine, EngineResult, OperatorResult};
pub use operators::{CustomFn, Operator, OperatorConfig, OperatorType, OperatorsFactory};

pub use veil_core::{Error, RecognizerResult, Result};
