//! Error types for record sources.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while enumerating records.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source file could not be read.
    #[error("IO error reading record source {path}: {source}")]
    Io {
        /// The source file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A source line could not be parsed into a record.
    #[error("invalid record at {path}:{line}: {reason}")]
    Parse {
        /// The source file path.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// The same identifier appears twice in the source.
    #[error("duplicate record id {id} at {path}:{line}")]
    DuplicateId {
        /// The source file path.
        path: PathBuf,
        /// One-based line number of the second occurrence.
        line: usize,
        /// The repeated identifier.
        id: i64,
    },

    /// Backend-specific failure reported by a custom source.
    #[error("record source unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse error.
    pub fn parse(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}
