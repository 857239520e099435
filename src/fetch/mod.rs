//! Fetching records into local storage.
//!
//! This module provides the pieces a single unit of work needs:
//!
//! - [`resolve_extension`] - derive `.jpg`-style extensions from locators
//! - [`Transport`] / [`HttpTransport`] - stream a locator's bytes into a sink
//! - [`FetchWorker`] - write one artifact and journal it
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use batchfetch_core::fetch::{FetchWorker, HttpTransport};
//! use batchfetch_core::journal::{ProgressJournal, TagJournal};
//! use batchfetch_core::source::Record;
//! use batchfetch_core::storage::StorageLayout;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let layout = StorageLayout::new("images");
//! layout.prepare().await?;
//! let worker = FetchWorker::new(
//!     Arc::new(HttpTransport::new()),
//!     layout.clone(),
//!     Arc::new(TagJournal::new(layout.tags_path())),
//!     Arc::new(ProgressJournal::new(layout.progress_path())),
//! );
//! let fetched = worker
//!     .process(&Record::new(100_003, "https://example.com/a.jpg"))
//!     .await?;
//! println!("saved {}", fetched.path.display());
//! # Ok(())
//! # }
//! ```

pub mod constants;
mod error;
mod extension;
mod transport;
mod worker;

pub use error::{FetchError, TransportError};
pub use extension::resolve_extension;
pub use transport::{HttpTransport, Transport};
pub use worker::{FetchWorker, FetchedArtifact};
