//! End-to-end collation run.
//!
//! A run validates the configuration, discovers candidates, classifies them
//! (phase 1), then packs the usable ones and flushes each bundle to disk as
//! soon as it closes (phase 2). Per-document and per-bundle failures are
//! absorbed into the [`RunResult`]; only configuration problems, an empty or
//! fully excluded source, and cancellation abort the run.
//!
//! # Examples
//!
//! ```no_run
//! use pdfcollate::config::Config;
//! use pdfcollate::io::LopdfBackend;
//! use pdfcollate::pipeline::Collator;
//! use pdfcollate::report::NullSink;
//! use tokio_util::sync::CancellationToken;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::new("scans", "bundles");
//! let collator = Collator::new(config, LopdfBackend::new());
//! let result = collator.run(&NullSink, &CancellationToken::new())?;
//! println!("{} bundles written", result.bundle_count());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::classify::Classifier;
use crate::config::Config;
use crate::discovery::discover;
use crate::error::{CollateError, Result};
use crate::io::{DocumentBackend, LopdfBackend, MergeWriter, write_atomic};
use crate::pack::{Bundle, Packer};
use crate::report::{
    BundleReport, BundleStatus, ReportSink, RunResult, SoftFailure, SoftFailureKind,
};

/// Runs the two-phase pipeline over one source directory.
pub struct Collator<B: DocumentBackend> {
    config: Config,
    backend: B,
}

impl<B: DocumentBackend> Collator<B> {
    /// Create a collator for `config` using `backend` for all document work.
    pub fn new(config: Config, backend: B) -> Self {
        Self { config, backend }
    }

    /// The run configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute a full run.
    ///
    /// `sink.started()` and `sink.finished()` are always emitted as a pair,
    /// whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid or a directory is missing
    /// - The source directory holds no candidate documents
    /// - Every candidate is excluded
    /// - The run is cancelled
    pub fn run(&self, sink: &dyn ReportSink, cancel: &CancellationToken) -> Result<RunResult> {
        let start = Instant::now();
        sink.started();

        let outcome = self.execute(sink, cancel);

        match &outcome {
            Ok(result) => tracing::info!(
                processed = result.processed,
                excluded = result.excluded_count(),
                bundles = result.bundle_count(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "collation finished"
            ),
            Err(err) => tracing::debug!(error = %err, "collation aborted"),
        }

        sink.finished();
        outcome
    }

    fn execute(&self, sink: &dyn ReportSink, cancel: &CancellationToken) -> Result<RunResult> {
        self.config.validate()?;

        sink.log(&format!("Scanning {}...", self.config.source_dir.display()));
        let candidates = discover(&self.config.source_dir)?;
        tracing::debug!(count = candidates.len(), "candidates discovered");

        let classifier = Classifier::new(&self.backend, &self.config);
        let report = classifier.classify(candidates, sink, cancel)?;

        let mut result = RunResult {
            excluded: report.excluded_documents(),
            ..RunResult::default()
        };
        let usable = report.into_usable()?;
        result.processed = usable.len();

        let total = usable.len();
        sink.log(&format!("Phase 2: Collating {total} files..."));

        let mut packer = Packer::new(self.config.target);

        for (index, candidate) in usable.into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(CollateError::Cancelled);
            }

            match self.backend.byte_size(&candidate.path) {
                Ok(size) => {
                    if let Some(bundle) = packer.push(candidate, size) {
                        self.flush(bundle, sink, cancel, &mut result)?;
                    }
                }
                Err(err) => {
                    sink.log(&format!(
                        "Skipping {}: Could not read file size.",
                        candidate.name
                    ));
                    tracing::warn!(file = %candidate.name, error = %err, "size probe failed");
                    result.soft_failures.push(SoftFailure::new(
                        SoftFailureKind::SizeProbe,
                        candidate.name,
                        err.to_string(),
                    ));
                }
            }

            if self.config.is_progress_tick(index) {
                sink.status(&format!("Collating: {}/{total}...", index + 1));
            }
        }

        if let Some(bundle) = packer.finish() {
            self.flush(bundle, sink, cancel, &mut result)?;
        }

        Ok(result)
    }

    /// Merge and write one closed bundle, recording its outcome.
    fn flush(
        &self,
        bundle: Bundle,
        sink: &dyn ReportSink,
        cancel: &CancellationToken,
        result: &mut RunResult,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(CollateError::Cancelled);
        }

        let name = bundle.name();
        let path = name.path_in(&self.config.output_dir);
        let mut report = BundleReport {
            index: bundle.index(),
            name: name.clone(),
            path: path.clone(),
            documents: bundle.document_names(),
            skipped: Vec::new(),
            input_bytes: bundle.total_bytes(),
            status: BundleStatus::Planned,
        };

        if self.config.dry_run {
            sink.log(&format!(
                "Planned {name} ({} files, {})",
                bundle.len(),
                crate::report::format_file_size(bundle.total_bytes())
            ));
            result.bundles.push(report);
            return Ok(());
        }

        sink.log(&format!("Writing {name} ({} files)...", bundle.len()));

        let mut writer = self.backend.writer();
        for document in bundle.documents() {
            let candidate = &document.candidate;
            if let Err(err) = writer.append(&candidate.path) {
                let reason = failure_reason(&err);
                sink.log(&format!(
                    " >> SKIP (append failed): {} ({reason})",
                    candidate.name
                ));
                tracing::warn!(file = %candidate.name, bundle = %name, error = %err, "append failed");
                report.skipped.push(candidate.name.clone());
                result.soft_failures.push(SoftFailure::new(
                    SoftFailureKind::Append,
                    candidate.name.clone(),
                    reason,
                ));
            }
        }

        let written = writer
            .serialize()
            .and_then(|bytes| write_atomic(&path, &bytes));

        match written {
            Ok(stats) => {
                sink.log(&format!("Saved: {name}"));
                tracing::debug!(
                    bundle = %name,
                    size = %stats.format_file_size(),
                    write_ms = stats.write_time.as_millis() as u64,
                    "bundle written"
                );
                report.status = BundleStatus::Written {
                    bytes_written: stats.file_size,
                };
            }
            Err(err) => {
                let reason = failure_reason(&err);
                sink.log(&format!("Failed to write {name}: {reason}"));
                tracing::warn!(bundle = %name, error = %err, "bundle write failed");
                result.soft_failures.push(SoftFailure::new(
                    SoftFailureKind::BundleWrite,
                    name.as_str(),
                    reason.clone(),
                ));
                report.status = BundleStatus::Failed { reason };
            }
        }

        result.bundles.push(report);
        Ok(())
    }
}

/// Short diagnostic for a log line that already names the subject.
fn failure_reason(err: &CollateError) -> String {
    match err {
        CollateError::AppendFailed { reason, .. } | CollateError::SerializeFailed { reason } => {
            reason.clone()
        }
        CollateError::WriteFailed { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

/// Run a collation on a blocking worker thread with the production backend.
///
/// # Errors
///
/// Returns the run's error, or [`CollateError::Other`] if the worker panicked.
pub async fn collate(
    config: Config,
    sink: Arc<dyn ReportSink>,
    cancel: CancellationToken,
) -> Result<RunResult> {
    collate_with(config, LopdfBackend::new(), sink, cancel).await
}

/// Run a collation on a blocking worker thread with a custom backend.
///
/// # Errors
///
/// Returns the run's error, or [`CollateError::Other`] if the worker panicked.
pub async fn collate_with<B>(
    config: Config,
    backend: B,
    sink: Arc<dyn ReportSink>,
    cancel: CancellationToken,
) -> Result<RunResult>
where
    B: DocumentBackend + 'static,
{
    tokio::task::spawn_blocking(move || Collator::new(config, backend).run(sink.as_ref(), &cancel))
        .await
        .map_err(|err| CollateError::other(format!("collation worker failed: {err}")))?
}
