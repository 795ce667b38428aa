//! pdfcollate - Collate a folder of PDF files into size-bounded bundles.
//!
//! A run works in two phases:
//!
//! - Phase 1 classifies every PDF in the source folder as usable or excluded
//!   (corrupt, or encrypted beyond reading)
//! - Phase 2 packs the usable documents, in file name order, into bundles
//!   whose combined input size stays under a target, writing each bundle as
//!   soon as it fills
//!
//! One bad document never aborts a bundle, and one failed bundle never
//! aborts the run. Everything that was skipped is reported in the
//! [`RunResult`](report::RunResult).
//!
//! # Examples
//!
//! ## Async entry point
//!
//! ```no_run
//! use pdfcollate::config::{Config, TargetSize};
//! use pdfcollate::report::NullSink;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::new("scans", "bundles").with_target(TargetSize::from_megabytes(25.0)?);
//! let result = pdfcollate::collate(config, Arc::new(NullSink), CancellationToken::new()).await?;
//! println!("Processed {} files into {} bundles", result.processed, result.bundle_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## Planning only
//!
//! ```
//! use pdfcollate::config::TargetSize;
//! use pdfcollate::discovery::Candidate;
//! use pdfcollate::pack::plan_bundles;
//! use std::path::PathBuf;
//!
//! let docs = [30u64, 30, 30, 90, 10].iter().enumerate().map(|(i, mb)| {
//!     let name = format!("{i}.pdf");
//!     let size = mb * 1024 * 1024;
//!     (Candidate { path: PathBuf::from(&name), name, size }, size)
//! });
//! let bundles = plan_bundles(docs, TargetSize::default());
//! assert_eq!(bundles.len(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classify;
pub mod config;
pub mod discovery;
pub mod error;
pub mod io;
pub mod output;
pub mod pack;
pub mod pipeline;
pub mod report;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{Config, TargetSize};
pub use error::{CollateError, Result};
pub use pipeline::{Collator, collate, collate_with};
pub use report::{ReportSink, RunResult};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
