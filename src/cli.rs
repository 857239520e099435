//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use batchfetch_core::{FailurePolicy, RunConfig};

/// Fetch a bounded batch of records into a single archive.
///
/// Records are read from a line file (`<id> <url> [tag,tag,...]`), fetched
/// concurrently into local storage, journaled so an interrupted run can
/// resume, and packaged into a zip archive together with their tags.
#[derive(Parser, Debug)]
#[command(name = "batchfetch")]
#[command(author, version, about)]
pub struct Args {
    /// Record file to read (`<id> <url> [tags]` per line, `#` starts a comment)
    pub source: PathBuf,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// TOML file with run settings; flags given here override it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum concurrent fetches (1-100)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: Option<u8>,

    /// Records requested from the source per page (1-1000)
    #[arg(short = 'p', long, value_parser = clap::value_parser!(u16).range(1..=1000))]
    pub page_size: Option<u16>,

    /// Maximum records fetched in one run
    #[arg(short = 'm', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_results: Option<u32>,

    /// Local storage directory for artifacts and journals
    #[arg(short = 's', long, value_name = "DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Archive to write
    #[arg(short = 'o', long = "archive", value_name = "FILE")]
    pub archive_path: Option<PathBuf>,

    /// What a failed fetch does to the run (skip or abort)
    #[arg(long)]
    pub failure_policy: Option<FailurePolicy>,

    /// Keep local storage after archiving
    #[arg(long)]
    pub keep_storage: bool,

    /// HTTP connect timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub connect_timeout: Option<u64>,

    /// HTTP request timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub read_timeout: Option<u64>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Applies the flags that were given on top of `config`.
    pub fn apply_to(&self, config: &mut RunConfig) {
        if let Some(value) = self.concurrency {
            config.concurrency = usize::from(value);
        }
        if let Some(value) = self.page_size {
            config.page_size = usize::from(value);
        }
        if let Some(value) = self.max_results {
            config.max_results = usize::try_from(value).unwrap_or(usize::MAX);
        }
        if let Some(dir) = &self.storage_dir {
            config.storage_dir.clone_from(dir);
        }
        if let Some(path) = &self.archive_path {
            config.archive_path.clone_from(path);
        }
        if let Some(policy) = self.failure_policy {
            config.failure_policy = policy;
        }
        if self.keep_storage {
            config.keep_storage = true;
        }
        if let Some(secs) = self.connect_timeout {
            config.connect_timeout_secs = secs;
        }
        if let Some(secs) = self.read_timeout {
            config.read_timeout_secs = secs;
        }
    }
}
