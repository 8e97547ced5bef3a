use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::infra::Storage;
use crate::models::HistoryEntry;

/// Reads and writes the history file: one JSON record per tracked book.
///
/// The file doubles as the roster of tracked books, so an unreadable or
/// structurally invalid file is an error rather than an empty default.
/// `save` rewrites the whole sequence; callers must load-mutate-save the
/// complete set.
pub struct HistoryStore<S> {
    storage: S,
    path: PathBuf,
}

impl<S: Storage> HistoryStore<S> {
    pub fn new(storage: S, path: PathBuf) -> Self {
        Self { storage, path }
    }

    pub fn load(&self) -> Result<Vec<HistoryEntry>> {
        let content = self
            .storage
            .read(&self.path)
            .map_err(|e| AppError::MalformedHistory(format!("{}: {e}", self.path.display())))?;

        serde_json::from_str(&content)
            .map_err(|e| AppError::MalformedHistory(format!("{}: {e}", self.path.display())))
    }

    pub fn save(&self, entries: &[HistoryEntry]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| AppError::MalformedHistory(e.to_string()))?;
        self.storage.write(&self.path, &json)?;
        Ok(())
    }
}
