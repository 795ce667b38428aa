//! Configuration module for pdfcollate.
//!
//! This module turns raw user input into a validated configuration that
//! drives a collation run. It handles:
//! - Parsing of the target bundle size
//! - Validation of the source and output directories
//! - Output naming for bundle files

use anyhow::{Context, bail};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{CollateError, Result};

/// Bytes in one megabyte, as presented to users.
pub const MEGABYTE: u64 = 1024 * 1024;

/// Default target bundle size in megabytes.
pub const DEFAULT_TARGET_MB: f64 = 80.0;

/// Default number of items between status updates.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 5;

/// File extension of candidate documents and bundle files.
pub const DOCUMENT_EXTENSION: &str = "pdf";

/// File name prefix of bundle files.
pub const BUNDLE_PREFIX: &str = "Collated_Part_";

/// Approximate upper bound on a bundle's total byte size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TargetSize(u64);

impl TargetSize {
    /// Create a target size from a byte count.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is zero.
    pub fn from_bytes(bytes: u64) -> Result<Self> {
        if bytes == 0 {
            return Err(CollateError::invalid_target_size(
                bytes.to_string(),
                "target size must be positive",
            ));
        }
        Ok(Self(bytes))
    }

    /// Create a target size from (possibly fractional) megabytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not finite or does not round to at
    /// least one byte.
    pub fn from_megabytes(megabytes: f64) -> Result<Self> {
        if !megabytes.is_finite() || megabytes <= 0.0 {
            return Err(CollateError::invalid_target_size(
                megabytes.to_string(),
                "target size must be a positive number",
            ));
        }
        let bytes = (megabytes * MEGABYTE as f64).floor();
        if bytes < 1.0 || bytes >= u64::MAX as f64 {
            return Err(CollateError::invalid_target_size(
                megabytes.to_string(),
                "target size is out of range",
            ));
        }
        Ok(Self(bytes as u64))
    }

    /// Get the size in bytes.
    pub fn bytes(&self) -> u64 {
        self.0
    }
}

impl Default for TargetSize {
    fn default() -> Self {
        Self((DEFAULT_TARGET_MB as u64) * MEGABYTE)
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::report::format_file_size(self.0))
    }
}

impl FromStr for TargetSize {
    type Err = CollateError;

    /// Parse a target size.
    ///
    /// A bare number is read as megabytes. A unit suffix of `B`, `K`/`KB`,
    /// `M`/`MB` or `G`/`GB` (any case) selects binary multiples of bytes.
    fn from_str(s: &str) -> Result<Self> {
        let (value, multiplier) =
            parse_size_parts(s).map_err(|err| CollateError::invalid_target_size(s, format!("{err:#}")))?;

        if multiplier == MEGABYTE {
            return Self::from_megabytes(value);
        }

        let bytes = (value * multiplier as f64).floor();
        if !bytes.is_finite() || bytes < 1.0 || bytes >= u64::MAX as f64 {
            return Err(CollateError::invalid_target_size(
                s,
                "target size must be at least one byte",
            ));
        }
        Ok(Self(bytes as u64))
    }
}

fn parse_size_parts(s: &str) -> anyhow::Result<(f64, u64)> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        bail!("size cannot be empty");
    }

    let split = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let value: f64 = number
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a number", number.trim()))?;

    if !value.is_finite() || value <= 0.0 {
        bail!("size must be a positive number");
    }

    let multiplier = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "m" | "mb" | "mib" => MEGABYTE,
        "b" => 1,
        "k" | "kb" | "kib" => 1024,
        "g" | "gb" | "gib" => 1024 * MEGABYTE,
        other => bail!("unknown size unit '{other}'. Use B, KB, MB or GB"),
    };

    Ok((value, multiplier))
}

/// Name of a closed bundle, derived from its 1-based sequence index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct BundleName(String);

impl BundleName {
    /// Derive the bundle name for `index`.
    ///
    /// The index is zero-padded to three digits so names sort in creation order.
    pub fn new(index: usize) -> Self {
        Self(format!("{BUNDLE_PREFIX}{index:03}.{DOCUMENT_EXTENSION}"))
    }

    /// The file name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve the bundle's destination inside `output_dir`.
    pub fn path_in(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.0)
    }
}

impl fmt::Display for BundleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Complete configuration for a collation run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for candidate documents.
    pub source_dir: PathBuf,

    /// Directory receiving bundle files.
    pub output_dir: PathBuf,

    /// Approximate upper bound on each bundle's size.
    pub target: TargetSize,

    /// Classify and plan bundles without writing anything.
    pub dry_run: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,

    /// Require encrypted documents to expose readable page content.
    pub strict_encryption: bool,

    /// Number of items between status updates.
    pub progress_interval: usize,
}

impl Config {
    /// Create a configuration with default settings for the given directories.
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            target: TargetSize::default(),
            dry_run: false,
            verbose: false,
            quiet: false,
            strict_encryption: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Set the target bundle size.
    pub fn with_target(mut self, target: TargetSize) -> Self {
        self.target = target;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The source or output directory does not exist or is not a directory
    /// - Verbose and quiet modes are both enabled
    /// - The progress interval is zero
    pub fn validate(&self) -> Result<()> {
        if !self.source_dir.exists() {
            return Err(CollateError::SourceNotFound {
                path: self.source_dir.clone(),
            });
        }
        if !self.source_dir.is_dir() {
            return Err(CollateError::NotADirectory {
                path: self.source_dir.clone(),
            });
        }

        if !self.output_dir.exists() {
            return Err(CollateError::OutputNotFound {
                path: self.output_dir.clone(),
            });
        }
        if !self.output_dir.is_dir() {
            return Err(CollateError::NotADirectory {
                path: self.output_dir.clone(),
            });
        }

        if self.verbose && self.quiet {
            return Err(CollateError::invalid_config(
                "Cannot use both --verbose and --quiet",
            ));
        }

        if self.progress_interval == 0 {
            return Err(CollateError::invalid_config(
                "Progress interval must be at least 1",
            ));
        }

        Ok(())
    }

    /// Check whether a status update is due for the 0-based item `index`.
    pub fn is_progress_tick(&self, index: usize) -> bool {
        index % self.progress_interval.max(1) == 0
    }
}
