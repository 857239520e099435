//! Per-record fetch worker.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};

use super::error::FetchError;
use super::extension::resolve_extension;
use super::transport::Transport;
use crate::journal::{ProgressJournal, TagJournal};
use crate::source::Record;
use crate::storage::StorageLayout;

/// Result of one successfully processed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArtifact {
    /// Record identifier.
    pub id: i64,
    /// Where the artifact was written.
    pub path: PathBuf,
    /// Number of bytes written.
    pub bytes: u64,
}

/// Retrieves one record into local storage and journals it.
///
/// Cloning is cheap: the transport and journals are shared through `Arc`.
/// A worker processes records independently; bounding how many run at once is
/// the coordinator's job.
#[derive(Clone)]
pub struct FetchWorker {
    transport: Arc<dyn Transport>,
    layout: StorageLayout,
    tags: Arc<TagJournal>,
    progress: Arc<ProgressJournal>,
}

impl std::fmt::Debug for FetchWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchWorker")
            .field("layout", &self.layout)
            .field("tags", &self.tags)
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

impl FetchWorker {
    /// Creates a worker writing into `layout` and the given journals.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        layout: StorageLayout,
        tags: Arc<TagJournal>,
        progress: Arc<ProgressJournal>,
    ) -> Self {
        Self {
            transport,
            layout,
            tags,
            progress,
        }
    }

    /// Fetches `record` and journals it.
    ///
    /// Order of effects: artifact written and synced, then the tag entry,
    /// then the progress entry. A record is therefore only marked done once
    /// everything else about it is on disk.
    ///
    /// On a transport failure the partial artifact is removed and no journal
    /// line is written, so the record is picked up again by the next run.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Transport`] if retrieval fails
    /// - [`FetchError::Artifact`] if the artifact cannot be created or synced
    /// - [`FetchError::Journal`] if either journal append fails
    #[instrument(skip(self, record), fields(id = record.id, url = %record.locator))]
    pub async fn process(&self, record: &Record) -> Result<FetchedArtifact, FetchError> {
        let extension = resolve_extension(&record.locator);
        let path = self.layout.artifact_path(record.id, extension);
        debug!(path = %path.display(), "fetching record");

        let file = File::create(&path)
            .await
            .map_err(|e| FetchError::artifact(record.id, &path, e))?;
        let mut writer = BufWriter::new(file);

        let bytes = match self.transport.retrieve(&record.locator, &mut writer).await {
            Ok(bytes) => bytes,
            Err(e) => {
                drop(writer);
                debug!(path = %path.display(), "removing partial artifact after error");
                let _ = tokio::fs::remove_file(&path).await;
                return Err(FetchError::transport(record.id, e));
            }
        };

        writer
            .flush()
            .await
            .map_err(|e| FetchError::artifact(record.id, &path, e))?;
        writer
            .into_inner()
            .sync_all()
            .await
            .map_err(|e| FetchError::artifact(record.id, &path, e))?;

        self.tags
            .record(record.id, extension, &record.tags)
            .await
            .map_err(|e| FetchError::journal(record.id, e))?;
        self.progress
            .record(record.id)
            .await
            .map_err(|e| FetchError::journal(record.id, e))?;

        info!(path = %path.display(), bytes, "record fetched");
        Ok(FetchedArtifact {
            id: record.id,
            path,
            bytes,
        })
    }
}
