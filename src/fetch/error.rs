//! Error types for the fetch module.
//!
//! [`TransportError`] covers failures of the remote side of a retrieval,
//! [`FetchError`] is what a worker reports back to the coordinator.

use std::path::PathBuf;

use thiserror::Error;

use crate::journal::JournalError;

/// Errors that can occur while retrieving a resource.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The locator is not a valid absolute URL.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Writing received bytes into the local sink failed.
    #[error("failed writing body of {url} to local storage: {source}")]
    Sink {
        /// The URL being written.
        url: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl TransportError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::timeout(url);
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a sink write error.
    pub fn sink(url: impl Into<String>, source: std::io::Error) -> Self {
        Self::Sink {
            url: url.into(),
            source,
        }
    }

    /// Returns true when the failure happened on the local side of the copy.
    ///
    /// Sink failures are local I/O errors and are never skippable.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Sink { .. })
    }
}

/// Errors reported by a [`FetchWorker`](super::FetchWorker) for one record.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The transport could not deliver the resource.
    #[error("record {id}: {source}")]
    Transport {
        /// Identifier of the record being fetched.
        id: i64,
        /// The underlying transport error.
        #[source]
        source: TransportError,
    },

    /// Creating, writing, or syncing the local artifact failed.
    #[error("record {id}: IO error writing artifact {path}: {source}")]
    Artifact {
        /// Identifier of the record being fetched.
        id: i64,
        /// Artifact path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Appending to a journal failed.
    #[error("record {id}: {source}")]
    Journal {
        /// Identifier of the record being fetched.
        id: i64,
        /// The underlying journal error.
        #[source]
        source: JournalError,
    },
}

impl FetchError {
    /// Creates a transport error for a record.
    pub fn transport(id: i64, source: TransportError) -> Self {
        Self::Transport { id, source }
    }

    /// Creates an artifact IO error for a record.
    pub fn artifact(id: i64, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Artifact {
            id,
            path: path.into(),
            source,
        }
    }

    /// Creates a journal error for a record.
    pub fn journal(id: i64, source: JournalError) -> Self {
        Self::Journal { id, source }
    }

    /// Returns the identifier of the record that failed.
    #[must_use]
    pub fn record_id(&self) -> i64 {
        match self {
            Self::Transport { id, .. } | Self::Artifact { id, .. } | Self::Journal { id, .. } => {
                *id
            }
        }
    }

    /// Returns true if a failure policy may skip this error.
    ///
    /// Only remote transport failures qualify; anything touching local
    /// storage or the journals is fatal.
    #[must_use]
    pub fn is_skippable(&self) -> bool {
        match self {
            Self::Transport { source, .. } => !source.is_local(),
            Self::Artifact { .. } | Self::Journal { .. } => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_http_status_display() {
        let error = TransportError::http_status("https://example.com/a.jpg", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(msg.contains("https://example.com/a.jpg"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_transport_error_timeout_display() {
        let error = TransportError::timeout("https://example.com/a.jpg");
        assert!(error.to_string().contains("timeout"));
    }

    #[test]
    fn test_transport_error_invalid_url_display() {
        let msg = TransportError::invalid_url("not-a-url").to_string();
        assert!(msg.contains("invalid URL"), "Expected 'invalid URL' in: {msg}");
        assert!(msg.contains("not-a-url"));
    }

    #[test]
    fn test_sink_error_is_local() {
        let io_error = std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full");
        let error = TransportError::sink("https://example.com/a.jpg", io_error);
        assert!(error.is_local());
        assert!(!TransportError::http_status("https://example.com/a.jpg", 500).is_local());
    }

    #[test]
    fn test_fetch_error_skippable_classification() {
        let remote = FetchError::transport(7, TransportError::http_status("https://h/a", 503));
        assert!(remote.is_skippable());
        assert_eq!(remote.record_id(), 7);

        let sink = FetchError::transport(
            8,
            TransportError::sink("https://h/a", std::io::Error::other("boom")),
        );
        assert!(!sink.is_skippable());

        let artifact = FetchError::artifact(
            9,
            "/tmp/9.jpg",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!artifact.is_skippable());
        assert!(artifact.to_string().contains("/tmp/9.jpg"));
    }
}
