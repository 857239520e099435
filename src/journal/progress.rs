//! Progress journal: the sole resume signal of a run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, instrument};

use super::{JournalError, append_line};

/// Durable, append-only log of fully processed record identifiers.
///
/// An identifier is only recorded after its artifact and tag entry were
/// written, so every line names a record whose bytes are on disk.
#[derive(Debug)]
pub struct ProgressJournal {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ProgressJournal {
    /// Creates a journal appending to `path`. Nothing is touched until the
    /// first [`record`](Self::record).
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

    /// Loads the resume set from the journal at `path`.
    ///
    /// A missing file (or missing storage directory) is a first run and yields
    /// an empty set. Blank lines are ignored and duplicates collapse.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError::MalformedEntry`] for the first line that is not
    /// an integer; no partial set is returned. Returns [`JournalError::Io`] if
    /// the file exists but cannot be read.
    #[instrument(fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<HashSet<i64>, JournalError> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no progress journal, starting fresh");
                return Ok(HashSet::new());
            }
            Err(e) => return Err(JournalError::io(path, e)),
        };

        let mut processed = HashSet::new();
        for (index, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let id = line
                .parse::<i64>()
                .map_err(|_| JournalError::malformed(path, index + 1, raw))?;
            processed.insert(id);
        }

        debug!(entries = processed.len(), "progress journal loaded");
        Ok(processed)
    }

    /// Appends one completed identifier.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError::Io`] if the journal cannot be opened, written,
    /// or synced.
    pub async fn record(&self, id: i64) -> Result<(), JournalError> {
        let line = format!("{id}\n");
        let _guard = self.lock.lock().await;
        append_line(&self.path, &line).await
    }
}
