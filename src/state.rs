//! Persistence of the last processed message id.
//!
//! The id is the only state that outlives a run; it makes re-running on an unchanged label a
//! no-op.

use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Stores the id of the last processed message.
pub trait StateStore: Send + Sync {
    /// Returns the last recorded id, or `None` if nothing was recorded yet.
    ///
    /// # Errors
    ///
    /// Returns an error if existing state cannot be read.
    fn last_processed(&self) -> Result<Option<String>>;

    /// Records `id` as processed, replacing any previous id.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    fn record_processed(&self, id: &str) -> Result<()>;
}

/// Keeps the id in a small text file.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Creates a store backed by the file at `path`. The file need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn last_processed(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let id = content.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Error::StateRead {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn record_processed(&self, id: &str) -> Result<()> {
        std::fs::write(&self.path, id).map_err(|source| Error::StateWrite {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), id, "Recorded processed message");
        Ok(())
    }
}

/// In-process store, for tests and one-off runs.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    last: Mutex<Option<String>>,
}

impl MemoryStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `id`.
    #[must_use]
    pub fn with_last(id: impl Into<String>) -> Self {
        Self {
            last: Mutex::new(Some(id.into())),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn last_processed(&self) -> Result<Option<String>> {
        Ok(self
            .last
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn record_processed(&self, id: &str) -> Result<()> {
        *self
            .last
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(id.to_string());
        Ok(())
    }
}
