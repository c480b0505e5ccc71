//! Sources of custom recognizers

use super::config::{CustomRecognizerConfig, CustomRecognizerSet};
use crate::config::{expand_home, is_toml, parse_config_str};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use veil_core::{Error, Result};

/// An external source of custom recognizer definitions
///
/// `latest_version` must be cheap compared to `fetch_all`; the registry only
/// fetches when the version token changes.
pub trait RecognizerStore: Send + Sync {
    /// Opaque token identifying the current content
    fn latest_version(&self) -> Result<String>;

    fn fetch_all(&self) -> Result<Vec<CustomRecognizerConfig>>;
}

/// Custom recognizers kept in a YAML or TOML file
///
/// The version token is the SHA-256 of the file contents.
#[derive(Debug)]
pub struct FileRecognizerStore {
    path: PathBuf,
}

impl FileRecognizerStore {
    /// # Errors
    /// - `Error::Io` if the file doesn't exist
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = expand_home(path.as_ref())?;
        if !path.exists() {
            error!("Recognizer file {:?} does not exist", path);
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Recognizer file {:?} not found", path),
            )));
        }

        info!("Initialized FileRecognizerStore for {:?}", path);
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| {
            error!("Failed to read recognizer file {:?}: {}", self.path, e);
            Error::Io(e)
        })
    }
}

pub(crate) fn content_version(contents: &str) -> String {
    format!("{:x}", Sha256::digest(contents.as_bytes()))
}

impl RecognizerStore for FileRecognizerStore {
    fn latest_version(&self) -> Result<String> {
        Ok(content_version(&self.read()?))
    }

    fn fetch_all(&self) -> Result<Vec<CustomRecognizerConfig>> {
        let contents = self.read()?;
        let set: CustomRecognizerSet = parse_config_str(&contents, is_toml(&self.path))?;
        debug!(
            path = ?self.path,
            recognizers = set.recognizers.len(),
            "Fetched custom recognizers"
        );
        Ok(set.recognizers)
    }
}
