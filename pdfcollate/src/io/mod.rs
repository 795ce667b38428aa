//! Document I/O for pdfcollate.
//!
//! The pipeline never touches PDF internals directly. It talks to a
//! [`DocumentBackend`], which can open a document for classification and hand
//! out [`MergeWriter`]s that accumulate documents into one bundle.
//! [`LopdfBackend`] is the production implementation.
//!
//! # Examples
//!
//! ```no_run
//! use pdfcollate::io::{DocumentBackend, LopdfBackend, MergeWriter, OpenedDocument};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = LopdfBackend::new();
//! let doc = backend.open(Path::new("input.pdf"))?;
//! println!("encrypted: {}, pages: {}", doc.is_encrypted(), doc.page_count()?);
//!
//! let mut writer = backend.writer();
//! writer.append(Path::new("input.pdf"))?;
//! let bytes = writer.serialize()?;
//! # Ok(())
//! # }
//! ```

pub mod reader;
pub mod writer;

pub use reader::{LopdfBackend, LopdfDocument};
pub use writer::{LopdfWriter, WriteStatistics, temp_path_for, write_atomic};

use crate::error::Result;
use std::path::Path;

/// A document opened for classification.
pub trait OpenedDocument {
    /// Whether the document reports itself as encrypted.
    fn is_encrypted(&self) -> bool;

    /// Read the page count.
    ///
    /// This is the structural probe used to decide whether an encrypted
    /// document is still readable.
    fn page_count(&self) -> Result<usize>;

    /// Check that page content can actually be read, not only counted.
    fn content_readable(&self) -> Result<()> {
        Ok(())
    }
}

/// Accumulates documents into a single output.
///
/// Dropping the writer releases everything it holds.
pub trait MergeWriter {
    /// Append every page of the document at `path`, returning the page count.
    ///
    /// A failed append must leave previously appended content intact.
    fn append(&mut self, path: &Path) -> Result<usize>;

    /// Number of documents appended so far.
    fn document_count(&self) -> usize;

    /// Serialize the accumulated content.
    fn serialize(&mut self) -> Result<Vec<u8>>;
}

/// Document library used by the pipeline.
pub trait DocumentBackend: Send + Sync {
    /// Handle returned by [`DocumentBackend::open`].
    type Document: OpenedDocument;

    /// Writer returned by [`DocumentBackend::writer`].
    type Writer: MergeWriter;

    /// Open and parse the document at `path`.
    fn open(&self, path: &Path) -> Result<Self::Document>;

    /// Create an empty writer for one bundle.
    fn writer(&self) -> Self::Writer;

    /// Current byte size of the document at `path`.
    fn byte_size(&self, path: &Path) -> std::io::Result<u64> {
        std::fs::metadata(path).map(|metadata| metadata.len())
    }
}
