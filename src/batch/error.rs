//! Error type for coordinator runs.

use thiserror::Error;

use crate::config::ConfigError;
use crate::fetch::FetchError;
use crate::source::SourceError;

/// Errors that end a coordinator run.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The run configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The record source failed to produce a page.
    #[error("record source error: {0}")]
    Source(#[from] SourceError),

    /// A worker failed in a way the failure policy does not tolerate.
    #[error("fetch failed: {0}")]
    Fetch(#[source] FetchError),

    /// A worker task panicked.
    #[error("worker for record {id} panicked")]
    WorkerPanicked {
        /// Identifier of the record the worker was processing.
        id: i64,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}
