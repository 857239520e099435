//! One complete run: resume, fetch, archive, clean up.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::archive::{ArchiveError, Archiver};
use crate::batch::{BatchCoordinator, BatchError, BatchPhase, BatchStats};
use crate::config::{ConfigError, RunConfig};
use crate::fetch::{FetchWorker, Transport};
use crate::journal::{JournalError, ProgressJournal, TagJournal};
use crate::source::RecordSource;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The run configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Local storage could not be prepared or removed.
    #[error("storage error on {path}: {source}")]
    Storage {
        /// The storage root.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The progress journal could not be loaded.
    #[error("cannot compute resume state: {0}")]
    Resume(#[from] JournalError),

    /// Paging or a worker failed fatally.
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// The archive could not be written.
    #[error("archiving failed: {0}")]
    Archive(#[from] ArchiveError),
}

/// How a finished run went, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every accepted record was fetched.
    Success,
    /// Some records were skipped after transport failures.
    Partial,
    /// The source had nothing that was not already processed.
    NothingNew,
    /// Dispatch was interrupted; storage was kept for the next run.
    Interrupted,
}

/// Everything a caller needs to know about a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Records dispatched to a worker.
    pub accepted: usize,
    /// Records fetched and journaled.
    pub completed: usize,
    /// Records skipped after transport failures.
    pub skipped: usize,
    /// Identifiers of the skipped records.
    pub skipped_ids: Vec<i64>,
    /// Records passed over because an earlier run already processed them.
    pub resumed: usize,
    /// Pages requested from the source.
    pub pages: usize,
    /// Archive written by this run.
    pub archive: Option<PathBuf>,
    /// Where a previous archive was moved.
    pub rotated: Option<PathBuf>,
    /// Number of entries in the archive.
    pub archive_entries: usize,
    /// Whether local storage was removed at the end.
    pub storage_removed: bool,
    /// Whether dispatch was interrupted.
    pub interrupted: bool,
}

impl RunSummary {
    fn from_stats(stats: BatchStats) -> Self {
        Self {
            accepted: stats.accepted,
            completed: stats.completed,
            skipped: stats.skipped,
            skipped_ids: stats.skipped_ids,
            resumed: stats.resumed,
            pages: stats.pages,
            archive: None,
            rotated: None,
            archive_entries: 0,
            storage_removed: false,
            interrupted: stats.interrupted,
        }
    }

    /// Classifies the run.
    #[must_use]
    pub fn outcome(&self) -> RunOutcome {
        if self.interrupted {
            RunOutcome::Interrupted
        } else if self.skipped > 0 {
            RunOutcome::Partial
        } else if self.accepted == 0 {
            RunOutcome::NothingNew
        } else {
            RunOutcome::Success
        }
    }
}

/// Runs the whole pipeline once.
///
/// 1. Prepares local storage and loads the resume set from the progress journal
/// 2. Pages the source and fetches records under the configured ceilings
/// 3. Archives local storage once every worker has joined
/// 4. Removes local storage unless `keep_storage` is set
///
/// An interrupted run stops after step 2 and keeps storage so the next run
/// resumes. A run that accepted nothing and finds nothing in storage writes
/// no archive, leaving any previous archive untouched.
///
/// # Errors
///
/// Returns [`PipelineError`] for every fatal condition; artifacts and journal
/// lines already written stay on disk.
#[instrument(skip_all, fields(storage = %config.storage_dir.display(), archive = %config.archive_path.display()))]
pub async fn run_pipeline(
    config: &RunConfig,
    source: Arc<dyn RecordSource>,
    transport: Arc<dyn Transport>,
    interrupted: Arc<AtomicBool>,
) -> Result<RunSummary, PipelineError> {
    config.validate()?;

    let layout = config.layout();
    layout
        .prepare()
        .await
        .map_err(|source| PipelineError::Storage {
            path: layout.root().to_path_buf(),
            source,
        })?;

    let resume = ProgressJournal::load(&layout.progress_path()).await?;
    if !resume.is_empty() {
        info!(entries = resume.len(), "resuming from previous progress");
    }

    let worker = FetchWorker::new(
        transport,
        layout.clone(),
        Arc::new(TagJournal::new(layout.tags_path())),
        Arc::new(ProgressJournal::new(layout.progress_path())),
    );
    let stats = BatchCoordinator::new(config, source, worker, resume)?
        .with_interrupt(interrupted)
        .run()
        .await?;
    let mut summary = RunSummary::from_stats(stats);

    if summary.interrupted {
        warn!(
            completed = summary.completed,
            "interrupted, keeping local storage for the next run"
        );
        return Ok(summary);
    }

    debug!(phase = %BatchPhase::Archiving, "archiving results");
    let archiver = Archiver::new(layout.clone(), &config.archive_path);
    if summary.accepted == 0 && archiver.entries().await?.is_empty() {
        info!("nothing fetched and storage is empty, no archive written");
    } else {
        let report = archiver.archive().await?;
        summary.archive_entries = report.entries.len();
        summary.archive = Some(report.path);
        summary.rotated = report.rotated;
    }

    if config.keep_storage {
        debug!(root = %layout.root().display(), "keeping local storage");
    } else {
        layout
            .cleanup()
            .await
            .map_err(|source| PipelineError::Storage {
                path: layout.root().to_path_buf(),
                source,
            })?;
        summary.storage_removed = true;
    }

    debug!(phase = %BatchPhase::Done, "run finished");
    Ok(summary)
}
