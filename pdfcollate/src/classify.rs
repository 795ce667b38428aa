//! Phase 1: sorting candidates into usable and excluded.
//!
//! Every candidate ends in exactly one [`Classification`]. Failures never
//! escape this module: a document that cannot be opened, or that is
//! encrypted and cannot be probed, is excluded and the scan moves on.

use serde::Serialize;
use std::fmt;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::discovery::Candidate;
use crate::error::{CollateError, Result};
use crate::io::{DocumentBackend, OpenedDocument};
use crate::report::{ExcludedDocument, ReportSink};

/// Why a candidate was excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// The document could not be opened or parsed.
    OpenFailed(String),
    /// The document is encrypted and its structure or content is unreadable.
    Locked(String),
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenFailed(detail) => write!(f, "Corrupt: {detail}"),
            Self::Locked(detail) => write!(f, "Locked: {detail}"),
        }
    }
}

/// Terminal classification of one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The candidate can be packed.
    Usable,
    /// The candidate is left out of every bundle.
    Excluded(ExclusionReason),
}

impl Classification {
    /// Check whether the candidate is usable.
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Usable)
    }
}

/// Outcome of classifying a full candidate list.
#[derive(Debug, Clone, Default)]
pub struct ClassificationReport {
    /// Usable candidates, in input order.
    pub usable: Vec<Candidate>,

    /// Excluded candidates with their reasons, in input order.
    pub excluded: Vec<(Candidate, ExclusionReason)>,
}

impl ClassificationReport {
    /// Total number of candidates classified.
    pub fn total(&self) -> usize {
        self.usable.len() + self.excluded.len()
    }

    /// Excluded documents in reporting form.
    pub fn excluded_documents(&self) -> Vec<ExcludedDocument> {
        self.excluded
            .iter()
            .map(|(candidate, reason)| ExcludedDocument {
                name: candidate.name.clone(),
                reason: reason.to_string(),
            })
            .collect()
    }

    /// Hand over the usable candidates.
    ///
    /// # Errors
    ///
    /// Returns [`CollateError::AllExcluded`] if nothing is usable.
    pub fn into_usable(self) -> Result<Vec<Candidate>> {
        if self.usable.is_empty() {
            return Err(CollateError::AllExcluded {
                count: self.excluded.len(),
            });
        }
        Ok(self.usable)
    }
}

/// Classifies candidates through a document backend.
pub struct Classifier<'a, B: DocumentBackend> {
    backend: &'a B,
    strict_encryption: bool,
    progress_interval: usize,
}

impl<'a, B: DocumentBackend> Classifier<'a, B> {
    /// Create a classifier using the settings in `config`.
    pub fn new(backend: &'a B, config: &Config) -> Self {
        Self {
            backend,
            strict_encryption: config.strict_encryption,
            progress_interval: config.progress_interval.max(1),
        }
    }

    /// Classify a single candidate.
    pub fn classify_one(&self, candidate: &Candidate) -> Classification {
        let document = match self.backend.open(&candidate.path) {
            Ok(document) => document,
            Err(err) => return Classification::Excluded(ExclusionReason::OpenFailed(detail(&err))),
        };

        if !document.is_encrypted() {
            return Classification::Usable;
        }

        // Encryption alone is not exclusionary; unreadability is.
        if let Err(err) = document.page_count() {
            return Classification::Excluded(ExclusionReason::Locked(detail(&err)));
        }

        if self.strict_encryption
            && let Err(err) = document.content_readable()
        {
            return Classification::Excluded(ExclusionReason::Locked(detail(&err)));
        }

        Classification::Usable
    }

    /// Classify every candidate in order.
    ///
    /// Emits one log line per excluded candidate as it is found, a status
    /// update every `progress_interval` items, and a summary at the end.
    ///
    /// # Errors
    ///
    /// Only returns [`CollateError::Cancelled`].
    pub fn classify(
        &self,
        candidates: Vec<Candidate>,
        sink: &dyn ReportSink,
        cancel: &CancellationToken,
    ) -> Result<ClassificationReport> {
        let total = candidates.len();
        let mut report = ClassificationReport::default();

        sink.log("Phase 1: Scanning for locked/corrupt files...");

        for (index, candidate) in candidates.into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(CollateError::Cancelled);
            }

            match self.classify_one(&candidate) {
                Classification::Usable => {
                    tracing::debug!(file = %candidate.name, "usable");
                    report.usable.push(candidate);
                }
                Classification::Excluded(reason) => {
                    tracing::debug!(file = %candidate.name, %reason, "excluded");
                    sink.log(&format!(" >> EXCLUDED: {} ({reason})", candidate.name));
                    report.excluded.push((candidate, reason));
                }
            }

            if index % self.progress_interval == 0 {
                sink.status(&format!("Scanning: {}/{total}...", index + 1));
            }
        }

        log_summary(&report, sink);

        Ok(report)
    }
}

fn log_summary(report: &ClassificationReport, sink: &dyn ReportSink) {
    if report.excluded.is_empty() {
        sink.log("Scan complete. All files are valid.");
        return;
    }

    sink.log("--- EXCLUSION REPORT ---");
    sink.log(&format!(
        "Skipped {} files (see above).",
        report.excluded.len()
    ));
    sink.log(&format!(
        "Proceeding with {} valid files.",
        report.usable.len()
    ));
    sink.log("------------------------");
}

/// First line of an error, without the path the log line already names.
fn detail(err: &CollateError) -> String {
    match err {
        CollateError::OpenFailed { reason, .. }
        | CollateError::Locked { reason, .. }
        | CollateError::AppendFailed { reason, .. } => reason.clone(),
        other => other.to_string().lines().next().unwrap_or_default().to_string(),
    }
}
