//! Error types for Veil Core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Construction-time errors
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    // Request-time errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    #[error("No matching recognizers were found for language '{language}' and entities {entities:?}")]
    NoRecognizersFound {
        language: String,
        entities: Vec<String>,
    },

    // Invariant violation between a match offset and the NLP token offsets
    #[error("Token alignment error: no token covers offset {start} (word '{word}')")]
    TokenAlignment { word: String, start: usize },

    #[error("NLP engine error: {0}")]
    Nlp(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error was caused by a malformed caller request rather than setup
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_) | Self::InvalidParameter(_) | Self::InvalidOperator(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
