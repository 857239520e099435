//! Record sources: where the batch gets its work from.
//!
//! A source enumerates [`Record`]s page by page in a stable order. A page
//! shorter than the requested size tells the coordinator the source is
//! exhausted.
//!
//! Two implementations ship with the crate:
//! - [`MemorySource`] - a fixed in-memory list
//! - [`FileSource`] - records loaded from a line-oriented text file

mod error;
mod file;

pub use error::SourceError;
pub use file::FileSource;

use async_trait::async_trait;

/// One unit of work: an identifier and the locator of its resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Externally assigned unique identifier.
    pub id: i64,
    /// URL of the resource.
    pub locator: String,
    /// Descriptive tags written to the tag journal.
    pub tags: Vec<String>,
}

impl Record {
    /// Creates a record without tags.
    pub fn new(id: i64, locator: impl Into<String>) -> Self {
        Self::with_tags(id, locator, Vec::new())
    }

    /// Creates a record with tags.
    pub fn with_tags(id: i64, locator: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            id,
            locator: locator.into(),
            tags,
        }
    }
}

/// Paged enumeration of candidate records.
///
/// Implementations must return pages in a stable order across calls within a
/// run, and return fewer than `page_size` records only once exhausted.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Returns up to `page_size` records starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the source cannot be read.
    async fn fetch_page(
        &self,
        page_size: usize,
        offset: usize,
    ) -> Result<Vec<Record>, SourceError>;
}

/// In-memory record source.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<Record>,
}

impl MemorySource {
    /// Creates a source serving `records` in order.
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the source holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn fetch_page(
        &self,
        page_size: usize,
        offset: usize,
    ) -> Result<Vec<Record>, SourceError> {
        Ok(page_of(&self.records, page_size, offset))
    }
}

/// Slices one page out of an ordered list; past-the-end offsets give an empty page.
pub(crate) fn page_of(records: &[Record], page_size: usize, offset: usize) -> Vec<Record> {
    let start = offset.min(records.len());
    let end = offset.saturating_add(page_size).min(records.len());
    records[start..end].to_vec()
}
