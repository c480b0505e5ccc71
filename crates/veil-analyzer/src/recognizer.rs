//! Recognizer contract and the lazily-loaded registry handle

mod nlp_recognizer;

pub use nlp_recognizer::NlpRecognizer;

use crate::nlp::NlpArtifacts;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};
use veil_core::{RecognitionMetadata, RecognizerResult, Result};

static NEXT_RECOGNIZER_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique recognizer id
pub fn next_recognizer_id(name: &str) -> String {
    let n = NEXT_RECOGNIZER_ID.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}", name, n)
}

/// Static description of a recognizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizerDescriptor {
    pub name: String,
    pub supported_entities: Vec<String>,
    pub supported_language: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_words: Option<Vec<String>>,
}

/// A unit that produces candidate spans for one language
///
/// `analyze` must be callable concurrently on the same instance. Heavy
/// resources belong in `load`, which [`RegisteredRecognizer`] runs exactly once.
pub trait EntityRecognizer: Send + Sync {
    fn name(&self) -> &str;

    /// Unique id used to map results back to their recognizer
    fn id(&self) -> &str;

    fn supported_entities(&self) -> &[String];

    fn supported_language(&self) -> &str;

    fn version(&self) -> &str {
        "0.0.1"
    }

    /// Words that raise confidence when found near a match
    fn context(&self) -> &[String] {
        &[]
    }

    /// One-time initialization
    fn load(&self) -> Result<()> {
        Ok(())
    }

    /// Find spans of the requested `entities` in `text`
    fn analyze(
        &self,
        text: &str,
        entities: &[String],
        nlp_artifacts: Option<&NlpArtifacts>,
    ) -> Result<Vec<RecognizerResult>>;

    fn descriptor(&self) -> RecognizerDescriptor {
        let context = self.context();
        RecognizerDescriptor {
            name: self.name().to_string(),
            supported_entities: self.supported_entities().to_vec(),
            supported_language: self.supported_language().to_string(),
            version: self.version().to_string(),
            context_words: (!context.is_empty()).then(|| context.to_vec()),
        }
    }

    /// Metadata stamped on every result this recognizer produces
    fn recognition_metadata(&self) -> RecognitionMetadata {
        RecognitionMetadata {
            recognizer_name: self.name().to_string(),
            recognizer_identifier: self.id().to_string(),
            is_score_enhanced_by_context: false,
        }
    }
}

/// Shared handle to a recognizer with a do-once load guard
#[derive(Clone)]
pub struct RegisteredRecognizer {
    inner: Arc<dyn EntityRecognizer>,
    loaded: Arc<OnceCell<()>>,
}

impl RegisteredRecognizer {
    pub fn new<R: EntityRecognizer + 'static>(recognizer: R) -> Self {
        Self::from_arc(Arc::new(recognizer))
    }

    pub fn from_arc(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self {
            inner: recognizer,
            loaded: Arc::new(OnceCell::new()),
        }
    }

    /// Run `load` if it has not completed yet; concurrent callers wait for the first
    pub fn ensure_loaded(&self) -> Result<()> {
        self.loaded
            .get_or_try_init(|| {
                info!(
                    recognizer = self.inner.name(),
                    language = self.inner.supported_language(),
                    "Loading recognizer"
                );
                self.inner.load()
            })
            .map(|_| ())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Load on first use, then analyze
    pub fn analyze(
        &self,
        text: &str,
        entities: &[String],
        nlp_artifacts: Option<&NlpArtifacts>,
    ) -> Result<Vec<RecognizerResult>> {
        self.ensure_loaded()?;
        let results = self.inner.analyze(text, entities, nlp_artifacts)?;
        debug!(
            recognizer = self.inner.name(),
            results = results.len(),
            "Recognizer finished"
        );
        Ok(results)
    }

    pub fn recognizer(&self) -> &Arc<dyn EntityRecognizer> {
        &self.inner
    }
}

impl Deref for RegisteredRecognizer {
    type Target = dyn EntityRecognizer;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl fmt::Debug for RegisteredRecognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredRecognizer")
            .field("name", &self.inner.name())
            .field("id", &self.inner.id())
            .field("language", &self.inner.supported_language())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
