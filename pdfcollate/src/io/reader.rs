//! PDF opening and probing backed by `lopdf`.

use lopdf::Document;
use lopdf::content::Content;
use std::path::{Path, PathBuf};

use crate::error::{CollateError, Result};
use crate::io::writer::LopdfWriter;
use crate::io::{DocumentBackend, OpenedDocument};

/// Production document backend.
#[derive(Debug, Clone)]
pub struct LopdfBackend {
    /// Compress bundle streams on serialization.
    compress: bool,
}

impl LopdfBackend {
    /// Create a backend with default settings.
    pub fn new() -> Self {
        Self { compress: true }
    }
}

impl Default for LopdfBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBackend for LopdfBackend {
    type Document = LopdfDocument;
    type Writer = LopdfWriter;

    fn open(&self, path: &Path) -> Result<LopdfDocument> {
        let document = Document::load(path)
            .map_err(|err| CollateError::open_failed(path.to_path_buf(), err.to_string()))?;

        Ok(LopdfDocument {
            path: path.to_path_buf(),
            document,
        })
    }

    fn writer(&self) -> LopdfWriter {
        LopdfWriter::new(self.compress)
    }
}

/// A parsed PDF held for classification.
#[derive(Debug)]
pub struct LopdfDocument {
    path: PathBuf,
    document: Document,
}

impl LopdfDocument {
    /// Path the document was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn locked(&self, reason: impl Into<String>) -> CollateError {
        CollateError::locked(self.path.clone(), reason)
    }
}

impl OpenedDocument for LopdfDocument {
    fn is_encrypted(&self) -> bool {
        self.document.is_encrypted()
    }

    fn page_count(&self) -> Result<usize> {
        let pages = self.document.get_pages();

        if pages.is_empty() && self.is_encrypted() {
            return Err(self.locked("page tree is unreadable"));
        }

        for (number, page_id) in &pages {
            self.document
                .get_dictionary(*page_id)
                .map_err(|err| self.locked(format!("page {number}: {err}")))?;
        }

        Ok(pages.len())
    }

    fn content_readable(&self) -> Result<()> {
        let (_, first_page) = self
            .document
            .get_pages()
            .into_iter()
            .next()
            .ok_or_else(|| self.locked("document has no pages"))?;

        let content = self
            .document
            .get_page_content(first_page)
            .map_err(|err| self.locked(format!("page content: {err}")))?;

        Content::decode(&content).map_err(|err| self.locked(format!("page content: {err}")))?;

        Ok(())
    }
}
