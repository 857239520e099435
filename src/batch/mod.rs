//! Batch coordinator: paging, bounded dispatch, and draining.
//!
//! The coordinator is the single control loop of a run. It pages through a
//! [`RecordSource`], skips identifiers already in the resume set, and spawns
//! one [`FetchWorker`] task per remaining record while holding two ceilings:
//!
//! - at most `concurrency` workers active at once (a semaphore permit moves
//!   into each task and is released when it finishes)
//! - at most `max_results` records accepted per run
//!
//! Resume is identifier based. Paging always starts at offset zero and the
//! offset advances by the full page length whatever was skipped, so records
//! completed out of order in an earlier run are still recognised.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashSet;
//! use std::sync::Arc;
//!
//! use batchfetch_core::batch::BatchCoordinator;
//! use batchfetch_core::config::RunConfig;
//! use batchfetch_core::fetch::{FetchWorker, HttpTransport};
//! use batchfetch_core::journal::{ProgressJournal, TagJournal};
//! use batchfetch_core::source::{MemorySource, Record};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::default();
//! let layout = config.layout();
//! layout.prepare().await?;
//! let worker = FetchWorker::new(
//!     Arc::new(HttpTransport::new()),
//!     layout.clone(),
//!     Arc::new(TagJournal::new(layout.tags_path())),
//!     Arc::new(ProgressJournal::new(layout.progress_path())),
//! );
//! let source = Arc::new(MemorySource::new(vec![Record::new(1, "https://example.com/1.jpg")]));
//! let coordinator = BatchCoordinator::new(&config, source, worker, HashSet::new())?;
//! let stats = coordinator.run().await?;
//! println!("accepted {}, completed {}", stats.accepted, stats.completed);
//! # Ok(())
//! # }
//! ```

mod error;
mod policy;

pub use error::BatchError;
pub use policy::FailurePolicy;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::RunConfig;
use crate::fetch::{FetchError, FetchWorker, FetchedArtifact};
use crate::source::RecordSource;

/// Poll interval for the interrupt flag while waiting on the concurrency gate.
const INTERRUPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Phases of a run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    /// Requesting the next page from the source.
    Paging,
    /// Spawning workers for the current page.
    Dispatching,
    /// Waiting for every spawned worker to finish.
    Draining,
    /// Packaging storage into the archive.
    Archiving,
    /// Finished.
    Done,
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Paging => "paging",
            Self::Dispatching => "dispatching",
            Self::Draining => "draining",
            Self::Archiving => "archiving",
            Self::Done => "done",
        };
        write!(f, "{label}")
    }
}

/// Counters from one coordinator run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Records dispatched to a worker.
    pub accepted: usize,
    /// Workers that finished and journaled their record.
    pub completed: usize,
    /// Records dropped after a skippable transport failure.
    pub skipped: usize,
    /// Records passed over because the resume set already covers them.
    pub resumed: usize,
    /// Pages requested from the source.
    pub pages: usize,
    /// Identifiers of skipped records, in join order.
    pub skipped_ids: Vec<i64>,
    /// Dispatch stopped early because of an interrupt.
    pub interrupted: bool,
}

/// Pages through a source and runs workers under the configured ceilings.
pub struct BatchCoordinator {
    source: Arc<dyn RecordSource>,
    worker: FetchWorker,
    resume: Arc<HashSet<i64>>,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    page_size: usize,
    max_results: usize,
    failure_policy: FailurePolicy,
    interrupted: Arc<AtomicBool>,
}

impl fmt::Debug for BatchCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchCoordinator")
            .field("concurrency", &self.concurrency)
            .field("page_size", &self.page_size)
            .field("max_results", &self.max_results)
            .field("failure_policy", &self.failure_policy)
            .field("resume_entries", &self.resume.len())
            .finish_non_exhaustive()
    }
}

impl BatchCoordinator {
    /// Creates a coordinator for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Config`] if the configuration is invalid.
    pub fn new(
        config: &RunConfig,
        source: Arc<dyn RecordSource>,
        worker: FetchWorker,
        resume: HashSet<i64>,
    ) -> Result<Self, BatchError> {
        config.validate()?;

        debug!(
            concurrency = config.concurrency,
            page_size = config.page_size,
            max_results = config.max_results,
            failure_policy = %config.failure_policy,
            resume_entries = resume.len(),
            "creating batch coordinator"
        );

        Ok(Self {
            source,
            worker,
            resume: Arc::new(resume),
            semaphore: Arc::new(Semaphore::new(config.concurrency)),
            concurrency: config.concurrency,
            page_size: config.page_size,
            max_results: config.max_results,
            failure_policy: config.failure_policy,
            interrupted: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Shares an interrupt flag; once set, no further records are dispatched.
    #[must_use]
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = interrupted;
        self
    }

    /// Runs paging, dispatch, and draining to completion.
    ///
    /// Every spawned worker is joined before this returns, including on the
    /// error paths, so nothing writes to storage afterwards.
    ///
    /// # Errors
    ///
    /// - [`BatchError::Source`] if a page cannot be fetched
    /// - [`BatchError::Fetch`] for the first fatal worker error (local I/O, or
    ///   any transport error under [`FailurePolicy::Abort`])
    /// - [`BatchError::WorkerPanicked`] if a worker task panicked
    /// - [`BatchError::SemaphoreClosed`] if the gate closes unexpectedly
    #[instrument(skip(self), fields(concurrency = self.concurrency, max_results = self.max_results))]
    pub async fn run(self) -> Result<BatchStats, BatchError> {
        let halted = Arc::new(AtomicBool::new(false));
        let mut stats = BatchStats::default();
        let mut handles: Vec<(i64, JoinHandle<Result<FetchedArtifact, FetchError>>)> = Vec::new();
        let mut dispatched: HashSet<i64> = HashSet::new();
        let mut offset = 0usize;
        let mut dispatch_error: Option<BatchError> = None;

        info!("starting batch");

        'paging: loop {
            debug!(phase = %BatchPhase::Paging, offset, "requesting page");
            let page = match self.source.fetch_page(self.page_size, offset).await {
                Ok(page) => page,
                Err(e) => {
                    dispatch_error = Some(BatchError::Source(e));
                    break;
                }
            };
            stats.pages += 1;

            let exhausted = page.len() < self.page_size;
            offset += page.len();
            debug!(
                phase = %BatchPhase::Dispatching,
                records = page.len(),
                exhausted,
                "page received"
            );

            for record in page {
                if self.resume.contains(&record.id) {
                    debug!(id = record.id, "already processed, skipping");
                    stats.resumed += 1;
                    continue;
                }
                if !dispatched.insert(record.id) {
                    warn!(id = record.id, "source repeated an identifier, skipping");
                    continue;
                }

                let acquired = tokio::select! {
                    biased;
                    () = wait_for_flag(&self.interrupted) => None,
                    result = Arc::clone(&self.semaphore).acquire_owned() => Some(result),
                };
                let permit = match acquired {
                    None => {
                        warn!("interrupted, no further records will be dispatched");
                        stats.interrupted = true;
                        break 'paging;
                    }
                    Some(Err(_)) => {
                        dispatch_error = Some(BatchError::SemaphoreClosed);
                        break 'paging;
                    }
                    Some(Ok(permit)) => permit,
                };
                if halted.load(Ordering::SeqCst) {
                    debug!("a worker failed fatally, stopping dispatch");
                    break 'paging;
                }

                let worker = self.worker.clone();
                let halted = Arc::clone(&halted);
                let policy = self.failure_policy;
                let id = record.id;
                handles.push((
                    id,
                    tokio::spawn(async move {
                        // Permit is dropped when this block exits (RAII)
                        let _permit = permit;
                        let result = worker.process(&record).await;
                        if let Err(e) = &result {
                            if !policy.tolerates(e) {
                                halted.store(true, Ordering::SeqCst);
                            }
                        }
                        result
                    }),
                ));
                stats.accepted += 1;

                if stats.accepted >= self.max_results {
                    info!(accepted = stats.accepted, "result ceiling reached");
                    break 'paging;
                }
            }

            if exhausted {
                debug!(offset, "source exhausted");
                break;
            }
            if halted.load(Ordering::SeqCst) || self.interrupted.load(Ordering::SeqCst) {
                stats.interrupted |= self.interrupted.load(Ordering::SeqCst);
                break;
            }
        }

        debug!(
            phase = %BatchPhase::Draining,
            task_count = handles.len(),
            "waiting for workers to complete"
        );

        let mut fatal: Option<BatchError> = None;
        for (id, handle) in handles {
            match handle.await {
                Ok(Ok(_)) => stats.completed += 1,
                Ok(Err(e)) if self.failure_policy.tolerates(&e) => {
                    warn!(id, error = %e, "record skipped, it will be retried next run");
                    stats.skipped += 1;
                    stats.skipped_ids.push(id);
                }
                Ok(Err(e)) => {
                    warn!(id, error = %e, "record failed fatally");
                    fatal.get_or_insert(BatchError::Fetch(e));
                }
                Err(e) => {
                    warn!(id, error = %e, "worker task panicked");
                    fatal.get_or_insert(BatchError::WorkerPanicked { id });
                }
            }
        }

        if let Some(e) = dispatch_error.or(fatal) {
            return Err(e);
        }

        info!(
            accepted = stats.accepted,
            completed = stats.completed,
            skipped = stats.skipped,
            resumed = stats.resumed,
            pages = stats.pages,
            interrupted = stats.interrupted,
            "batch drained"
        );
        Ok(stats)
    }
}

/// Resolves once `flag` is set.
async fn wait_for_flag(flag: &AtomicBool) {
    while !flag.load(Ordering::SeqCst) {
        tokio::time::sleep(INTERRUPT_POLL_INTERVAL).await;
    }
}
