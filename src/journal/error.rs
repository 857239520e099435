//! Error types for journal operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or appending a journal.
#[derive(Debug, Error)]
pub enum JournalError {
    /// File system error while opening, reading, or appending.
    #[error("IO error on journal {path}: {source}")]
    Io {
        /// The journal file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A progress line did not parse as an identifier.
    #[error("malformed entry at {path}:{line}: {content:?} is not an identifier")]
    MalformedEntry {
        /// The journal file path.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// The offending line content.
        content: String,
    },
}

impl JournalError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a malformed entry error.
    pub fn malformed(path: impl Into<PathBuf>, line: usize, content: impl Into<String>) -> Self {
        Self::MalformedEntry {
            path: path.into(),
            line,
            content: content.into(),
        }
    }
}
