//! Append-only journals written by fetch workers.
//!
//! Two independent files are kept in local storage:
//! - [`ProgressJournal`] - one identifier per completed record, read back at
//!   startup to build the resume set
//! - [`TagJournal`] - one `{id}{ext};{tags}` line per completed record,
//!   shipped inside the final archive
//!
//! Each journal serializes its own appends behind its own lock. The two locks
//! are never held together.

mod error;
mod progress;
mod tags;

pub use error::JournalError;
pub use progress::ProgressJournal;
pub use tags::TagJournal;

use std::path::Path;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Appends `line` to the file at `path`, creating it if needed, and syncs it.
async fn append_line(path: &Path, line: &str) -> Result<(), JournalError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| JournalError::io(path, e))?;

    file.write_all(line.as_bytes())
        .await
        .map_err(|e| JournalError::io(path, e))?;
    file.flush().await.map_err(|e| JournalError::io(path, e))?;
    file.sync_data().await.map_err(|e| JournalError::io(path, e))?;

    Ok(())
}
