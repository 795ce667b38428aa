//! Error types for pdfcollate.
//!
//! Only configuration errors, the all-excluded condition and cancellation
//! ever unwind to the caller of a run. The per-document and per-bundle
//! variants are produced by the backend and the bundle writer, then absorbed
//! into the run's soft-failure list.
//!
//! # Error Categories
//!
//! - **Configuration**: missing directories, no documents, bad target size
//! - **Terminal**: every candidate excluded, run cancelled
//! - **Per-item**: open, append, serialize and write failures

use std::io;
use std::path::PathBuf;

/// Result type alias for pdfcollate operations.
pub type Result<T> = std::result::Result<T, CollateError>;

/// Main error type for pdfcollate operations.
#[derive(Debug, thiserror::Error)]
pub enum CollateError {
    /// Source directory does not exist.
    #[error("Source folder does not exist: {}", path.display())]
    SourceNotFound {
        /// The missing source directory.
        path: PathBuf,
    },

    /// Output directory does not exist.
    #[error("Output folder does not exist: {}", path.display())]
    OutputNotFound {
        /// The missing output directory.
        path: PathBuf,
    },

    /// A path that must be a directory is something else.
    #[error("Not a directory: {}", path.display())]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// The source directory holds no matching documents.
    #[error("No PDF files found in source directory: {}", path.display())]
    NoDocuments {
        /// The scanned source directory.
        path: PathBuf,
    },

    /// Every candidate was excluded during classification.
    #[error("All files were excluded (locked or corrupt): {count} file(s) scanned")]
    AllExcluded {
        /// Number of excluded candidates.
        count: usize,
    },

    /// The target bundle size is not a positive number.
    #[error("Invalid target size '{value}': {reason}")]
    InvalidTargetSize {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// A document could not be opened or parsed.
    #[error("Failed to open PDF: {}\n  Reason: {reason}", path.display())]
    OpenFailed {
        /// Path to the document.
        path: PathBuf,
        /// Backend diagnostic.
        reason: String,
    },

    /// An encrypted document could not be probed.
    #[error("PDF is locked: {}\n  Reason: {reason}", path.display())]
    Locked {
        /// Path to the document.
        path: PathBuf,
        /// Backend diagnostic.
        reason: String,
    },

    /// A document could not be appended into a bundle.
    #[error("Failed to append {}: {reason}", path.display())]
    AppendFailed {
        /// Path to the document.
        path: PathBuf,
        /// Backend diagnostic.
        reason: String,
    },

    /// A bundle could not be serialized.
    #[error("Failed to serialize bundle: {reason}")]
    SerializeFailed {
        /// Backend diagnostic.
        reason: String,
    },

    /// A bundle file could not be written.
    #[error("Failed to write {}\n  Reason: {source}", path.display())]
    WriteFailed {
        /// Destination being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The run was cancelled before completion.
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<lopdf::Error> for CollateError {
    fn from(err: lopdf::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl From<anyhow::Error> for CollateError {
    fn from(err: anyhow::Error) -> Self {
        Self::other(format!("{err:#}"))
    }
}

impl CollateError {
    /// Create an OpenFailed error.
    pub fn open_failed(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::OpenFailed {
            path,
            reason: reason.into(),
        }
    }

    /// Create a Locked error.
    pub fn locked(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::Locked {
            path,
            reason: reason.into(),
        }
    }

    /// Create an AppendFailed error.
    pub fn append_failed(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::AppendFailed {
            path,
            reason: reason.into(),
        }
    }

    /// Create a SerializeFailed error.
    pub fn serialize_failed(reason: impl Into<String>) -> Self {
        Self::SerializeFailed {
            reason: reason.into(),
        }
    }

    /// Create an InvalidTargetSize error.
    pub fn invalid_target_size(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTargetSize {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this error is a configuration error raised before any processing.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::SourceNotFound { .. }
                | Self::OutputNotFound { .. }
                | Self::NotADirectory { .. }
                | Self::NoDocuments { .. }
                | Self::InvalidTargetSize { .. }
                | Self::InvalidConfig { .. }
        )
    }

    /// Check if this error is absorbed into the run result instead of aborting it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::OpenFailed { .. }
                | Self::Locked { .. }
                | Self::AppendFailed { .. }
                | Self::SerializeFailed { .. }
                | Self::WriteFailed { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SourceNotFound { .. } => 2,
            Self::OutputNotFound { .. } => 2,
            Self::NotADirectory { .. } => 2,
            Self::NoDocuments { .. } => 1,
            Self::AllExcluded { .. } => 3,
            Self::InvalidTargetSize { .. } => 2,
            Self::InvalidConfig { .. } => 2,
            Self::OpenFailed { .. } => 3,
            Self::Locked { .. } => 3,
            Self::AppendFailed { .. } => 6,
            Self::SerializeFailed { .. } => 6,
            Self::WriteFailed { .. } => 5,
            Self::Cancelled => 130, // Standard exit code for SIGINT
            Self::Io { .. } => 5,
            Self::Other { .. } => 1,
        }
    }
}
