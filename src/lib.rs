//! Batchfetch Core Library
//!
//! This library fetches a bounded batch of remote resources described by a
//! record source, stores each one locally, journals the work so an
//! interrupted run can resume, and packages the results into a single archive.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`source`] - Paged record sources (in-memory and line files)
//! - [`fetch`] - Extension resolution, HTTP transport, and the per-record worker
//! - [`journal`] - Append-only progress and tag journals
//! - [`batch`] - Coordinator enforcing the concurrency and result ceilings
//! - [`archive`] - Final archive creation with rotation of older results
//! - [`pipeline`] - One complete run: resume, fetch, archive, clean up

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod batch;
pub mod config;
pub mod fetch;
pub mod journal;
pub mod pipeline;
pub mod source;
pub mod storage;

// Re-export commonly used types
pub use archive::{ArchiveError, ArchiveReport, Archiver};
pub use batch::{BatchCoordinator, BatchError, BatchPhase, BatchStats, FailurePolicy};
pub use config::{ConfigError, RunConfig};
pub use fetch::{FetchError, FetchWorker, HttpTransport, Transport, TransportError, resolve_extension};
pub use journal::{JournalError, ProgressJournal, TagJournal};
pub use pipeline::{PipelineError, RunOutcome, RunSummary, run_pipeline};
pub use source::{FileSource, MemorySource, Record, RecordSource, SourceError};
pub use storage::StorageLayout;
