//! Tag journal: per-record descriptive metadata.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use super::{JournalError, append_line};

/// Durable, append-only log of `{id}{extension};{tags}` lines.
///
/// Write-only during a run; the archiver ships the whole file.
#[derive(Debug)]
pub struct TagJournal {
    path: PathBuf,
    lock: Mutex<()>,
}

impl TagJournal {
    /// Creates a journal appending to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the journal file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one tag entry. `tags` are joined with `,`.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError::Io`] if the journal cannot be opened, written,
    /// or synced.
    pub async fn record(
        &self,
        id: i64,
        extension: &str,
        tags: &[String],
    ) -> Result<(), JournalError> {
        let line = format_entry(id, extension, tags);
        let _guard = self.lock.lock().await;
        append_line(&self.path, &line).await
    }
}

fn format_entry(id: i64, extension: &str, tags: &[String]) -> String {
    format!("{id}{extension};{}\n", tags.join(","))
}
