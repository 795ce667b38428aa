//! pdfcollate - Collate a folder of PDF files into size-bounded bundles.
//!
//! Command-line front end: parses arguments, wires Ctrl-C to cancellation,
//! runs the pipeline and prints a summary.

mod cli;

use clap::Parser;
use std::process;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use pdfcollate::error::CollateError;
use pdfcollate::output::{ConsoleSink, OutputFormatter, display_summary};
use pdfcollate::report::{NullSink, ReportSink, RunResult};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Run the application and handle errors
    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

/// Install the diagnostics subscriber on stderr.
///
/// `RUST_LOG` wins when set.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "pdfcollate=debug" } else { "warn" };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Main application logic.
async fn run(cli: Cli) -> Result<(), CollateError> {
    cli.validate()?;
    let config = cli.to_config()?;

    let formatter = OutputFormatter::from_config(&config);
    let sink: Arc<dyn ReportSink> = if cli.json {
        Arc::new(NullSink)
    } else {
        Arc::new(ConsoleSink::from_config(&config))
    };

    if formatter.is_verbose() {
        formatter.section(&format!("{} v{}", pdfcollate::NAME, pdfcollate::VERSION));
        formatter.detail("Source", &config.source_dir.display().to_string());
        formatter.detail("Output", &config.output_dir.display().to_string());
        formatter.detail("Target size", &config.target.to_string());
        formatter.blank_line();
    }

    let cancel = CancellationToken::new();
    let interrupt = watch_interrupt(cancel.clone());

    let outcome = pdfcollate::collate(config, sink, cancel).await;
    interrupt.abort();
    let result = outcome?;

    if cli.json {
        print_json(&result)?;
    } else {
        formatter.blank_line();
        display_summary(&formatter, &result);
    }

    Ok(())
}

/// Cancel the run on the first Ctrl-C.
fn watch_interrupt(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current file");
            cancel.cancel();
        }
    })
}

fn print_json(result: &RunResult) -> Result<(), CollateError> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|err| CollateError::other(format!("Failed to encode result: {err}")))?;
    println!("{json}");
    Ok(())
}
