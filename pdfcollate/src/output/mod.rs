//! Console output for pdfcollate.
//!
//! This module handles all user-facing output including:
//! - Formatted log lines with quiet and verbose modes
//! - A single overwritable status line
//! - The end-of-run summary
//!
//! # Examples
//!
//! ```no_run
//! use pdfcollate::config::Config;
//! use pdfcollate::output::ConsoleSink;
//! use pdfcollate::report::ReportSink;
//!
//! # fn example(config: Config) {
//! let sink = ConsoleSink::from_config(&config);
//! sink.log("Phase 1: Scanning for locked/corrupt files...");
//! sink.status("Scanning: 1/10...");
//! # }
//! ```

pub mod formatter;
pub mod status;

pub use formatter::{MessageLevel, OutputFormatter};
pub use status::StatusLine;

use crate::config::Config;
use crate::report::{ReportSink, RunResult};

/// Report sink that prints to the terminal.
#[derive(Debug)]
pub struct ConsoleSink {
    formatter: OutputFormatter,
    status: StatusLine,
}

impl ConsoleSink {
    /// Create a console sink.
    pub fn new(formatter: OutputFormatter, status: StatusLine) -> Self {
        Self { formatter, status }
    }

    /// Create a console sink following the quiet/verbose settings.
    pub fn from_config(config: &Config) -> Self {
        let status = if config.quiet {
            StatusLine::disabled()
        } else {
            StatusLine::new()
        };
        Self::new(OutputFormatter::from_config(config), status)
    }

    /// The formatter used for log lines.
    pub fn formatter(&self) -> &OutputFormatter {
        &self.formatter
    }
}

impl ReportSink for ConsoleSink {
    fn log(&self, line: &str) {
        self.status.clear();
        self.formatter.log_line(line);
    }

    fn status(&self, message: &str) {
        self.status.set(message);
    }

    fn started(&self) {
        self.status.reset();
    }

    fn finished(&self) {
        self.status.reset();
    }
}

/// Summary lines for a finished run.
pub fn summary_lines(result: &RunResult) -> Vec<String> {
    let mut lines = vec![
        "Done! Processing complete.".to_string(),
        format!("Processed: {} files", result.processed),
    ];

    if result.excluded_count() > 0 {
        lines.push(format!(
            "Skipped: {} locked/corrupt files",
            result.excluded_count()
        ));
    }

    lines
}

/// Display the end-of-run summary.
pub fn display_summary(formatter: &OutputFormatter, result: &RunResult) {
    for line in summary_lines(result) {
        formatter.info(&line);
    }

    let failed = result.failed_bundles();
    if !failed.is_empty() {
        formatter.warning(&format!(
            "Warning: {} bundle(s) could not be written",
            failed.len()
        ));
    }

    let skipped: usize = result.bundles.iter().map(|b| b.skipped.len()).sum();
    if skipped > 0 {
        formatter.warning(&format!(
            "Warning: {skipped} document(s) could not be appended"
        ));
    }

    for bundle in &result.bundles {
        formatter.detail(
            bundle.name.as_str(),
            &format!(
                "{} files, {}",
                bundle.documents.len() - bundle.skipped.len(),
                crate::report::format_file_size(bundle.input_bytes)
            ),
        );
    }
}
