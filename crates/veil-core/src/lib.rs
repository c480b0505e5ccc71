//! Veil Core Types
//!
//! This crate provides the types shared by the recognition and anonymization pipelines:
//! - The scored span model (`RecognizerResult`)
//! - Decision-process traces (`AnalysisExplanation`)
//! - Core error types

pub mod error;
pub mod explanation;
pub mod span;

pub use error::{Error, Result};
pub use explanation::AnalysisExplanation;
pub use span::{RecognitionMetadata, RecognizerResult, normalize_score};
