//! Recognizer registry
//!
//! Holds the recognizers available to the analyzer and answers which of them
//! apply to a request. The set is kept as an `Arc` snapshot: readers clone the
//! snapshot and never wait on writers for longer than the pointer swap.

pub mod config;
mod store;

pub use config::{
    CustomRecognizerConfig, CustomRecognizerSet, LanguageConfig, PredefinedRecognizerConfig,
    RecognizerConfig, RecognizerConfigEntry, RegistryConfig,
};
pub use store::{FileRecognizerStore, RecognizerStore};

use crate::pattern::RegexFlags;
use crate::predefined::default_recognizers;
use crate::recognizer::RegisteredRecognizer;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, error, info, warn};
use veil_core::{Error, Result};

/// Custom recognizers installed from a [`RecognizerStore`]
#[derive(Debug, Default)]
struct CustomState {
    version: Option<String>,
    ids: HashSet<String>,
}

pub struct RecognizerRegistry {
    supported_languages: Vec<String>,
    global_regex_flags: RegexFlags,
    recognizers: RwLock<Arc<Vec<RegisteredRecognizer>>>,
    /// Bumped on every change to the recognizer set
    version: AtomicU64,
    custom: Mutex<CustomState>,
}

impl RecognizerRegistry {
    /// An empty registry for `supported_languages`
    pub fn new<I, S>(supported_languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            supported_languages: supported_languages.into_iter().map(Into::into).collect(),
            global_regex_flags: RegexFlags::default(),
            recognizers: RwLock::new(Arc::new(Vec::new())),
            version: AtomicU64::new(0),
            custom: Mutex::new(CustomState::default()),
        }
    }

    /// A registry holding the predefined recognizers for `supported_languages`
    pub fn with_predefined<I, S>(supported_languages: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new(supported_languages);
        registry.load_predefined_recognizers(None)?;
        Ok(registry)
    }

    /// Flags used for predefined and custom recognizers added from now on
    pub fn with_regex_flags(mut self, flags: RegexFlags) -> Self {
        self.global_regex_flags = flags;
        self
    }

    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        config.validate()?;
        let mut registry = Self::new(config.supported_languages.iter().cloned());
        if let Some(flags) = config.global_regex_flags {
            registry.global_regex_flags = flags;
        }
        registry.add_all(config.build_recognizers()?);
        Ok(registry)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_config(&RegistryConfig::from_file(path)?)
    }

    pub fn supported_languages(&self) -> &[String] {
        &self.supported_languages
    }

    pub fn global_regex_flags(&self) -> RegexFlags {
        self.global_regex_flags
    }

    /// Composition version, bumped on every add, remove or refresh
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Current recognizer set
    pub fn recognizers(&self) -> Arc<Vec<RegisteredRecognizer>> {
        self.recognizers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.recognizers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.recognizers().is_empty()
    }

    /// Replace the snapshot with `f(current)`
    fn update<F>(&self, f: F)
    where
        F: FnOnce(&[RegisteredRecognizer]) -> Vec<RegisteredRecognizer>,
    {
        let mut guard = self
            .recognizers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let next = f(&guard);
        *guard = Arc::new(next);
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    pub fn add_recognizer(&self, recognizer: RegisteredRecognizer) {
        info!(
            recognizer = recognizer.name(),
            language = recognizer.supported_language(),
            entities = ?recognizer.supported_entities(),
            "Adding recognizer"
        );
        self.update(|current| {
            let mut next = current.to_vec();
            next.push(recognizer);
            next
        });
    }

    fn add_all(&self, recognizers: Vec<RegisteredRecognizer>) {
        if recognizers.is_empty() {
            return;
        }
        info!(count = recognizers.len(), "Adding recognizers");
        self.update(|current| {
            let mut next = current.to_vec();
            next.extend(recognizers);
            next
        });
    }

    /// Remove recognizers named `name`, optionally only for one language
    ///
    /// Returns how many were removed.
    pub fn remove_recognizer(&self, name: &str, language: Option<&str>) -> usize {
        let mut removed = 0;
        self.update(|current| {
            let next: Vec<_> = current
                .iter()
                .filter(|r| {
                    !(r.name() == name && language.is_none_or(|l| r.supported_language() == l))
                })
                .cloned()
                .collect();
            removed = current.len() - next.len();
            next
        });
        if removed == 0 {
            warn!(recognizer = name, "No recognizer removed");
        } else {
            info!(recognizer = name, removed, "Removed recognizer");
        }
        removed
    }

    /// Add the predefined recognizers for `languages` (the registry's languages when `None`),
    /// compiled with the registry's regex flags
    pub fn load_predefined_recognizers(&self, languages: Option<&[String]>) -> Result<()> {
        let languages = languages.unwrap_or(&self.supported_languages);
        self.add_all(default_recognizers(languages, self.global_regex_flags)?);
        Ok(())
    }

    /// Add every recognizer defined in a registry configuration file
    ///
    /// Returns how many recognizers were added.
    pub fn add_recognizers_from_yaml(&self, path: impl AsRef<Path>) -> Result<usize> {
        let config = RegistryConfig::from_file(path)?;
        let recognizers = config.build_recognizers()?;
        let count = recognizers.len();
        self.add_all(recognizers);
        Ok(count)
    }

    /// Build and add a custom pattern recognizer
    pub fn add_pattern_recognizer_from_config(&self, config: &CustomRecognizerConfig) -> Result<()> {
        let recognizers = config.build(&self.supported_languages, self.global_regex_flags)?;
        self.add_all(recognizers);
        Ok(())
    }

    /// Recognizers for one request
    ///
    /// Exactly one of `entities` and `all_fields` must be given; an empty
    /// `entities` list counts as `all_fields`. `ad_hoc` recognizers are
    /// considered alongside the registered ones.
    pub fn get_recognizers(
        &self,
        language: &str,
        entities: Option<&[String]>,
        all_fields: bool,
        ad_hoc: &[RegisteredRecognizer],
    ) -> Result<Vec<RegisteredRecognizer>> {
        let all_fields = all_fields || entities.is_some_and(<[String]>::is_empty);
        let entities = entities.filter(|e| !e.is_empty());

        let snapshot = self.recognizers();
        let candidates: Vec<&RegisteredRecognizer> = snapshot
            .iter()
            .chain(ad_hoc)
            .filter(|r| r.supported_language() == language)
            .collect();

        let selected: Vec<RegisteredRecognizer> = match (entities, all_fields) {
            (Some(_), true) | (None, false) => {
                return Err(Error::InvalidRequest(
                    "Exactly one of entities or all_fields must be provided".to_string(),
                ));
            }
            (None, true) => candidates.into_iter().cloned().collect(),
            (Some(entities), false) => {
                let mut seen = HashSet::new();
                let mut selected = Vec::new();
                for entity in entities {
                    let matching: Vec<_> = candidates
                        .iter()
                        .filter(|r| r.supported_entities().contains(entity))
                        .collect();
                    if matching.is_empty() {
                        warn!(entity = %entity, language, "Entity doesn't have a recognizer");
                        continue;
                    }
                    for recognizer in matching {
                        if seen.insert(recognizer.id().to_string()) {
                            selected.push((*recognizer).clone());
                        }
                    }
                }
                selected
            }
        };

        if selected.is_empty() {
            return Err(Error::NoRecognizersFound {
                language: language.to_string(),
                entities: entities.map(<[String]>::to_vec).unwrap_or_default(),
            });
        }

        debug!(
            language,
            recognizers = selected.len(),
            "Selected recognizers for request"
        );
        Ok(selected)
    }

    /// Entity types that have at least one recognizer, sorted
    pub fn get_supported_entities(&self, languages: Option<&[String]>) -> Vec<String> {
        let snapshot = self.recognizers();
        snapshot
            .iter()
            .filter(|r| languages.is_none_or(|ls| ls.iter().any(|l| l == r.supported_language())))
            .flat_map(|r| r.supported_entities().iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Version token of the custom recognizers currently installed
    pub fn custom_version(&self) -> Option<String> {
        self.custom
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .version
            .clone()
    }

    /// Sync custom recognizers with `store`
    ///
    /// Fetches only when the store's version differs from the installed one.
    /// Installation is compare-and-swap on that version, so a refresher that
    /// lost a race leaves the winner's set alone. When the store fails the
    /// last-known-good set stays in place and the error is returned.
    ///
    /// Returns `true` when a new set was installed.
    pub fn refresh_custom_recognizers(&self, store: &dyn RecognizerStore) -> Result<bool> {
        let loaded = self.custom_version();

        let latest = store.latest_version().inspect_err(|e| {
            warn!(error = %e, "Recognizer store unavailable, keeping current custom recognizers");
        })?;
        if loaded.as_deref() == Some(latest.as_str()) {
            debug!(version = %latest, "Custom recognizers up to date");
            return Ok(false);
        }

        let configs = store.fetch_all().inspect_err(|e| {
            warn!(error = %e, "Failed to fetch custom recognizers, keeping current set");
        })?;
        let mut fresh = Vec::new();
        for config in configs.iter().filter(|c| c.enabled) {
            let built = config
                .build(&self.supported_languages, self.global_regex_flags)
                .inspect_err(|e| {
                    error!(recognizer = %config.name, error = %e, "Invalid custom recognizer");
                })?;
            fresh.extend(built);
        }

        let mut custom = self
            .custom
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if custom.version != loaded {
            debug!("Custom recognizers changed during refresh, skipping install");
            return Ok(false);
        }

        let stale_ids = std::mem::take(&mut custom.ids);
        custom.ids = fresh.iter().map(|r| r.id().to_string()).collect();
        custom.version = Some(latest.clone());
        let count = fresh.len();
        self.update(|current| {
            current
                .iter()
                .filter(|r| !stale_ids.contains(r.id()))
                .cloned()
                .chain(fresh)
                .collect()
        });

        info!(version = %latest, count, "Installed custom recognizers");
        Ok(true)
    }
}

impl std::fmt::Debug for RecognizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognizerRegistry")
            .field("supported_languages", &self.supported_languages)
            .field("version", &self.version())
            .field("recognizers", &self.len())
            .finish()
    }
}
