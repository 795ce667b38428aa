//! Candidate discovery.
//!
//! Lists the source directory once per run. Only regular files directly inside
//! the directory whose name ends in `.pdf` (any case) become candidates.
//! Subdirectories are never descended into.

use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::DOCUMENT_EXTENSION;
use crate::error::{CollateError, Result};

/// A discovered input document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Candidate {
    /// Full path to the document.
    pub path: PathBuf,

    /// File name, used for ordering and reporting.
    pub name: String,

    /// Size in bytes observed at discovery.
    pub size: u64,
}

impl Candidate {
    /// Build a candidate from a path, reading its size from the filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error if the file metadata cannot be read.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let size = std::fs::metadata(&path)?.len();
        let name = file_name_of(&path);
        Ok(Self { path, name, size })
    }
}

/// Check whether a file name carries the document extension.
pub fn has_document_extension(name: &str) -> bool {
    let suffix = format!(".{DOCUMENT_EXTENSION}");
    name.to_lowercase().ends_with(&suffix)
}

/// Discover candidate documents in `source_dir`.
///
/// Candidates are returned sorted lexicographically by file name, which is
/// the only ordering the rest of the pipeline relies on.
///
/// # Errors
///
/// Returns [`CollateError::NoDocuments`] if no candidate is found, or an I/O
/// error if the directory itself cannot be listed.
pub fn discover(source_dir: &Path) -> Result<Vec<Candidate>> {
    let mut candidates = Vec::new();

    let walker = WalkDir::new(source_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(err
                    .into_io_error()
                    .map(CollateError::from)
                    .unwrap_or_else(|| CollateError::other("Failed to list source directory")));
            }
            Err(err) => {
                tracing::debug!(error = %err, "ignoring unreadable directory entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if !has_document_extension(&name) {
            continue;
        }

        let size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                tracing::debug!(file = %name, error = %err, "size unavailable at discovery");
                0
            }
        };

        candidates.push(Candidate {
            path: entry.into_path(),
            name,
            size,
        });
    }

    if candidates.is_empty() {
        return Err(CollateError::NoDocuments {
            path: source_dir.to_path_buf(),
        });
    }

    candidates.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::debug!(count = candidates.len(), "discovered candidates");

    Ok(candidates)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
