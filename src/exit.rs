//! Exit code logic for the batchfetch process.
//!
//! Single responsibility: map a run outcome to the process exit code.

use std::process::ExitCode;

use batchfetch_core::RunOutcome;

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every accepted record was fetched and archived.
    Success,
    /// The run failed or was interrupted.
    Failure,
    /// The run finished but some records were skipped.
    Partial,
    /// Nothing new was found in the source.
    NoNewRecords,
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Partial => 2,
            Self::NoNewRecords => 3,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

/// Determines the process exit outcome for a finished run.
pub(crate) fn determine_exit_outcome(outcome: RunOutcome) -> ProcessExit {
    match outcome {
        RunOutcome::Success => ProcessExit::Success,
        RunOutcome::Partial => ProcessExit::Partial,
        RunOutcome::NothingNew => ProcessExit::NoNewRecords,
        RunOutcome::Interrupted => ProcessExit::Failure,
    }
}
