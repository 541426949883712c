//! File-backed save store.

use std::io;
use std::path::{Path, PathBuf};

use idle_core::error::{GameError, Result};
use idle_core::persistence::SaveStore;

/// Save store backed by a single file on disk.
///
/// Writes go to a sibling temporary file first and are renamed into place,
/// so a crash mid-write can never leave a truncated save behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, err: &io::Error) -> GameError {
        GameError::StorageUnavailable(format!("{}: {err}", self.path.display()))
    }
}

impl SaveStore for FileStore {
    fn put(&mut self, payload: &str) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, payload).map_err(|e| self.unavailable(&e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.unavailable(&e))?;
        Ok(())
    }

    fn get(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.unavailable(&e)),
        }
    }

    fn clear(&mut self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.unavailable(&e)),
        }
    }
}
