//! Reporting surface for collation runs.
//!
//! A run talks to its caller through a [`ReportSink`]: an ordered stream of
//! human-readable log lines, a most-recent-only status string, and a pair of
//! started/finished signals. The structured outcome is a [`RunResult`], which
//! also carries every soft failure so callers never depend on the log alone.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::config::BundleName;

/// Receiver of a run's log lines and status updates.
pub trait ReportSink: Send + Sync {
    /// Append one diagnostic line.
    fn log(&self, line: &str);

    /// Replace the current short status message.
    fn status(&self, message: &str);

    /// Called once when a run begins.
    fn started(&self) {}

    /// Called once when a run ends, successfully or not.
    fn finished(&self) {}
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn log(&self, _line: &str) {}

    fn status(&self, _message: &str) {}
}

/// Sink that records everything in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
    statuses: Mutex<Vec<String>>,
    signals: Mutex<(usize, usize)>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All log lines received so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Every status message received so far, oldest first.
    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// The most recent status message.
    pub fn last_status(&self) -> Option<String> {
        self.statuses().pop()
    }

    /// Number of (started, finished) signals received.
    pub fn signals(&self) -> (usize, usize) {
        self.signals.lock().map(|s| *s).unwrap_or_default()
    }

    /// Check whether any log line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl ReportSink for MemorySink {
    fn log(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }

    fn status(&self, message: &str) {
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.push(message.to_string());
        }
    }

    fn started(&self) {
        if let Ok(mut signals) = self.signals.lock() {
            signals.0 += 1;
        }
    }

    fn finished(&self) {
        if let Ok(mut signals) = self.signals.lock() {
            signals.1 += 1;
        }
    }
}

/// A candidate that was classified as excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedDocument {
    /// File name of the excluded document.
    pub name: String,

    /// Diagnostic reason for the exclusion.
    pub reason: String,
}

/// Kind of a failure that was absorbed without aborting the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftFailureKind {
    /// A candidate's byte size could not be read during packing.
    SizeProbe,
    /// A document could not be appended into its bundle.
    Append,
    /// A bundle could not be serialized or written.
    BundleWrite,
}

/// A failure absorbed into the run result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoftFailure {
    /// What kind of step failed.
    pub kind: SoftFailureKind,

    /// Document or bundle name the failure concerns.
    pub subject: String,

    /// Diagnostic message.
    pub message: String,
}

impl SoftFailure {
    /// Create a soft failure record.
    pub fn new(kind: SoftFailureKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Final state of a closed bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BundleStatus {
    /// The bundle file was written.
    Written {
        /// Size of the written file.
        bytes_written: u64,
    },
    /// Serializing or writing the bundle failed.
    Failed {
        /// Diagnostic message.
        reason: String,
    },
    /// Dry run: the bundle was planned but not written.
    Planned,
}

/// Report for one closed bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleReport {
    /// 1-based sequence index.
    pub index: usize,

    /// Derived output file name.
    pub name: BundleName,

    /// Destination path.
    pub path: PathBuf,

    /// Names of the documents assigned to the bundle, in order.
    pub documents: Vec<String>,

    /// Names of assigned documents whose append failed.
    pub skipped: Vec<String>,

    /// Sum of the assigned documents' sizes.
    pub input_bytes: u64,

    /// Outcome of the flush.
    pub status: BundleStatus,
}

impl BundleReport {
    /// Check whether this bundle failed to write.
    pub fn is_failed(&self) -> bool {
        matches!(self.status, BundleStatus::Failed { .. })
    }
}

/// Aggregate outcome of a collation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    /// Number of usable documents processed.
    pub processed: usize,

    /// Excluded documents with their reasons, in discovery order.
    pub excluded: Vec<ExcludedDocument>,

    /// Closed bundles, in sequence order.
    pub bundles: Vec<BundleReport>,

    /// Failures absorbed during the run.
    pub soft_failures: Vec<SoftFailure>,
}

impl RunResult {
    /// Number of excluded documents.
    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }

    /// Names of excluded documents.
    pub fn excluded_names(&self) -> Vec<&str> {
        self.excluded.iter().map(|e| e.name.as_str()).collect()
    }

    /// Number of bundles produced.
    pub fn bundle_count(&self) -> usize {
        self.bundles.len()
    }

    /// Bundles that failed to write.
    pub fn failed_bundles(&self) -> Vec<&BundleReport> {
        self.bundles.iter().filter(|b| b.is_failed()).collect()
    }

    /// Check whether the run completed without exclusions or soft failures.
    pub fn is_clean(&self) -> bool {
        self.excluded.is_empty() && self.soft_failures.is_empty()
    }
}

/// Format a byte count as a human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
