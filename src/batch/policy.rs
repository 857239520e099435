//! What a failed retrieval does to the rest of the run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::fetch::FetchError;

/// Policy for records whose retrieval fails.
///
/// Local I/O failures are fatal under every policy; the policy only decides
/// the fate of remote transport failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and move on. The record gets no journal lines, so the
    /// next run tries it again.
    #[default]
    Skip,
    /// Stop dispatching, drain in-flight workers, and fail the run.
    Abort,
}

impl FailurePolicy {
    /// Returns true if a run may continue past `error`.
    #[must_use]
    pub fn tolerates(self, error: &FetchError) -> bool {
        self == Self::Skip && error.is_skippable()
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(format!(
                "unknown failure policy {other:?}: expected \"skip\" or \"abort\""
            )),
        }
    }
}
