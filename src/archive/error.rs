//! Error types for archive creation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while writing the final archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// File system error reading storage or writing the archive.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The archive writer rejected an operation.
    #[error("archive writer error on {path}: {source}")]
    Zip {
        /// The archive path.
        path: PathBuf,
        /// The underlying writer error.
        #[source]
        source: zip::result::ZipError,
    },

    /// A previous archive could not be moved aside.
    #[error("failed to rotate {from} to {to}: {source}")]
    Rotate {
        /// The existing archive.
        from: PathBuf,
        /// The rotation target.
        to: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The blocking archive task did not complete.
    #[error("archive task failed: {0}")]
    Task(String),
}

impl ArchiveError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an archive writer error.
    pub fn zip(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Zip {
            path: path.into(),
            source,
        }
    }
}
