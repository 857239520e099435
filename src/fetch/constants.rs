//! Constants for the fetch module (HTTP timeouts).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default total request timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;
