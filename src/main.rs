//! CLI entry point for the libros harvester.

use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use libros_core::{HarvestConfig, RetryPolicy, WorkResolver};
use tracing::{debug, error, info};

mod app_config;
mod cli;
mod input;
mod progress;

use cli::Args;
use input::WorkInput;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
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

    // stdout carries the JSON records; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = build_harvest_config(&args)?;
    let inputs = input::collect_inputs(&args.inputs, args.input_file.as_deref())?;
    if inputs.is_empty() {
        info!("No input provided. Pass handles as arguments, with --input-file, or via stdin.");
        info!("Example: echo 92214 | libros");
        return Ok(ExitCode::SUCCESS);
    }

    info!(works = inputs.len(), "Libros starting");
    let failed = run_batch(WorkResolver::new(config), &inputs, !args.quiet).await?;

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Defaults, then the config file, then CLI flags.
fn build_harvest_config(args: &Args) -> Result<HarvestConfig> {
    let mut config = HarvestConfig::default();

    if let Some((path, file_config)) = app_config::load_file_config(args.config.as_deref())? {
        debug!(path = %path.display(), "loaded config file");
        file_config.apply(&mut config);
    }

    if let Some(max_attempts) = args.max_attempts {
        config.fetch.retry = RetryPolicy::new(max_attempts, config.fetch.retry.backoff());
    }
    if let Some(secs) = args.backoff_secs {
        let backoff = config.fetch.retry.backoff().with_delay(Duration::from_secs(secs));
        config.fetch.retry = RetryPolicy::new(config.fetch.retry.max_attempts(), backoff);
    }
    if let Some(secs) = args.timeout_secs {
        config.fetch.total_timeout = Duration::from_secs(secs);
    }
    if let Some(cap) = args.max_in_flight {
        config.fetch.max_in_flight =
            Some(usize::try_from(cap).context("max_in_flight out of range")?);
    }

    Ok(config)
}

/// Resolves every input in order, printing one JSON line per work.
///
/// Returns the number of works that failed.
async fn run_batch(resolver: WorkResolver, inputs: &[WorkInput], show_progress: bool) -> Result<usize> {
    let bar = progress::batch_progress(inputs.len(), show_progress);
    let mut stdout = io::stdout().lock();
    let mut failed = 0usize;

    for input in inputs {
        bar.set_message(input.as_str().to_string());
        let outcome = match input {
            WorkInput::Handle(handle) => resolver.resolve_handle(handle).await,
            WorkInput::DocumentUri(uri) => resolver.resolve_uri(uri).await,
        };

        match outcome {
            Ok(work) => {
                let line = serde_json::to_string(&work).context("Failed to serialize work")?;
                bar.suspend(|| writeln!(stdout, "{line}"))
                    .context("Failed to write to stdout")?;
            }
            Err(e) => {
                failed += 1;
                bar.suspend(|| error!(input = input.as_str(), error = %e, "failed to resolve work"));
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    info!(
        resolved = inputs.len() - failed,
        failed,
        total = inputs.len(),
        "Harvest complete"
    );
    Ok(failed)
}
