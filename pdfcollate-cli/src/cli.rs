//! CLI argument parsing for pdfcollate.
//!
//! This module defines the command-line interface structure using `clap`.
//! It handles argument parsing, validation, and help text generation.

use clap::Parser;
use std::path::PathBuf;

use pdfcollate::config::{Config, DEFAULT_TARGET_MB, TargetSize};
use pdfcollate::error::{CollateError, Result};

/// Collate a folder of PDF files into size-bounded bundles.
///
/// Every PDF directly inside the source folder is checked first. Corrupt
/// files and encrypted files that cannot be read are excluded and listed.
/// The remaining files are merged, in file name order, into
/// Collated_Part_001.pdf, Collated_Part_002.pdf, ... in the output folder,
/// each bundle staying under the target size where possible.
#[derive(Parser, Debug)]
#[command(name = "pdfcollate")]
#[command(version)]
#[command(about = "Collate a folder of PDF files into size-bounded bundles", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Folder containing the PDF files to collate
    ///
    /// Only files directly inside the folder are considered.
    /// Subfolders are ignored.
    #[arg(short, long, value_name = "DIR", env = "PDFCOLLATE_SOURCE")]
    pub source: PathBuf,

    /// Folder receiving the Collated_Part_NNN.pdf bundles
    ///
    /// Existing bundles with the same names are replaced.
    #[arg(short, long, value_name = "DIR", env = "PDFCOLLATE_OUTPUT")]
    pub output: PathBuf,

    /// Approximate maximum bundle size in megabytes
    ///
    /// A single file larger than this still gets a bundle of its own.
    #[arg(long, value_name = "MB", default_value_t = DEFAULT_TARGET_MB)]
    pub size_mb: f64,

    /// Approximate maximum bundle size with a unit (e.g. "500KB", "1.5GB")
    ///
    /// A bare number is read as megabytes.
    #[arg(long, value_name = "SIZE", conflicts_with = "size_mb")]
    pub size: Option<String>,

    /// Dry run - check files and plan bundles without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbose output - show per-bundle details and debug diagnostics
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all non-error output
    ///
    /// Only warnings and errors will be printed.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print the run result as JSON instead of log lines
    #[arg(long)]
    pub json: bool,

    /// Also exclude encrypted files whose page content cannot be decoded
    ///
    /// By default an encrypted file is kept as long as its pages can be
    /// counted.
    #[arg(long)]
    pub strict_encryption: bool,
}

impl Cli {
    /// Resolve the target bundle size.
    ///
    /// # Errors
    ///
    /// Returns an error if the size is zero, negative or malformed.
    pub fn target_size(&self) -> Result<TargetSize> {
        match self.size.as_deref() {
            Some(size) => size.parse(),
            None => TargetSize::from_megabytes(self.size_mb),
        }
    }

    /// Convert CLI arguments into a Config.
    ///
    /// Directory checks are left to the run itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the target size is invalid.
    pub fn to_config(&self) -> Result<Config> {
        let mut config = Config::new(&self.source, &self.output).with_target(self.target_size()?);
        config.dry_run = self.dry_run;
        // JSON output owns stdout.
        config.verbose = self.verbose && !self.json;
        config.quiet = self.quiet || self.json;
        config.strict_encryption = self.strict_encryption;

        Ok(config)
    }

    /// Validate CLI arguments before processing.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<()> {
        if self.source.as_os_str().is_empty() {
            return Err(CollateError::invalid_config("Source folder cannot be empty"));
        }

        if self.output.as_os_str().is_empty() {
            return Err(CollateError::invalid_config("Output folder cannot be empty"));
        }

        self.target_size()?;

        Ok(())
    }
}
