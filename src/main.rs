//! CLI entry point for the batchfetch tool.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use batchfetch_core::{FileSource, HttpTransport, RunConfig, RunSummary, run_pipeline};
use clap::Parser;
use tracing::{debug, error, info, warn};

mod cli;
mod exit;

use cli::Args;
use exit::{ProcessExit, determine_exit_outcome};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    init_tracing(&args);
    debug!(?args, "CLI arguments parsed");

    match run(&args).await {
        Ok(exit) => exit.into(),
        Err(e) => {
            error!("{e:#}");
            ProcessExit::Failure.into()
        }
    }
}

/// Priority: `RUST_LOG` env var > quiet flag > verbose flag > default (info)
fn init_tracing(args: &Args) {
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

async fn run(args: &Args) -> Result<ProcessExit> {
    let mut config = match &args.config {
        Some(path) => load_config(path).await?,
        None => RunConfig::default(),
    };
    args.apply_to(&mut config);
    config.validate().context("invalid run configuration")?;

    let source = FileSource::open(&args.source)
        .await
        .with_context(|| format!("cannot read records from {}", args.source.display()))?;
    info!(
        records = source.len(),
        source = %args.source.display(),
        "batchfetch starting"
    );

    let transport =
        HttpTransport::new_with_timeouts(config.connect_timeout_secs, config.read_timeout_secs);

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_signal = Arc::clone(&interrupted);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupted_signal.store(true, Ordering::SeqCst);
        }
    });

    let summary = run_pipeline(
        &config,
        Arc::new(source),
        Arc::new(transport),
        interrupted,
    )
    .await?;

    report(&summary, args.json)?;
    Ok(determine_exit_outcome(summary.outcome()))
}

async fn load_config(path: &Path) -> Result<RunConfig> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    let config = toml::from_str(&text)
        .with_context(|| format!("cannot parse config file {}", path.display()))?;
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

fn report(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(summary).context("cannot encode run summary")?;
        println!("{text}");
    }

    if !summary.skipped_ids.is_empty() {
        warn!(ids = ?summary.skipped_ids, "some records were skipped and will be retried next run");
    }
    match &summary.archive {
        Some(path) => info!(
            completed = summary.completed,
            skipped = summary.skipped,
            resumed = summary.resumed,
            entries = summary.archive_entries,
            archive = %path.display(),
            "batch complete"
        ),
        None if summary.interrupted => warn!(
            completed = summary.completed,
            "batch interrupted before archiving, run again with the same storage to resume"
        ),
        None => info!(resumed = summary.resumed, "no new records to fetch"),
    }
    if let Some(rotated) = &summary.rotated {
        info!(previous = %rotated.display(), "rotated previous archive");
    }
    Ok(())
}
