//! Bundle assembly and writing.
//!
//! This module provides:
//! - [`LopdfWriter`], which appends whole documents into one merged PDF
//! - [`write_atomic`], which puts serialized bytes on disk via a temporary
//!   sibling file and a rename, so a bundle never appears half-written

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{CollateError, Result};
use crate::io::MergeWriter;
use crate::report::format_file_size;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Upper bound on page tree depth when resolving inherited attributes.
const MAX_TREE_DEPTH: usize = 64;

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// Merges whole documents into one PDF using `lopdf`.
///
/// The first appended document donates the catalog and page tree. Pages of
/// later documents are renumbered, re-parented onto that tree and appended
/// in order.
#[derive(Debug)]
pub struct LopdfWriter {
    merged: Option<Document>,
    documents: usize,
    compress: bool,
}

impl LopdfWriter {
    /// Create an empty writer.
    pub fn new(compress: bool) -> Self {
        Self {
            merged: None,
            documents: 0,
            compress,
        }
    }

    /// Total pages accumulated so far.
    pub fn page_count(&self) -> usize {
        self.merged
            .as_ref()
            .map(|doc| doc.get_pages().len())
            .unwrap_or(0)
    }
}

impl MergeWriter for LopdfWriter {
    fn append(&mut self, path: &Path) -> Result<usize> {
        let fail = |reason: String| CollateError::append_failed(path.to_path_buf(), reason);

        let mut doc = Document::load(path).map_err(|err| fail(err.to_string()))?;
        strip_encryption(&mut doc).map_err(fail)?;
        let page_count = doc.get_pages().len();

        match self.merged.as_mut() {
            None => {
                self.merged = Some(doc);
            }
            Some(merged) => {
                // Resolve everything fallible before touching the merged document.
                let pages_id = root_pages_id(merged).map_err(fail)?;

                inherit_page_attributes(&mut doc);
                doc.renumber_objects_with(merged.max_id + 1);
                let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

                merged.max_id = merged.max_id.max(doc.max_id);
                merged.objects.extend(doc.objects);
                attach_pages(merged, pages_id, &page_ids);
            }
        }

        self.documents += 1;
        Ok(page_count)
    }

    fn document_count(&self) -> usize {
        self.documents
    }

    fn serialize(&mut self) -> Result<Vec<u8>> {
        let mut doc = self
            .merged
            .take()
            .ok_or_else(|| CollateError::serialize_failed("no documents could be appended"))?;

        doc.prune_objects();
        doc.renumber_objects();
        if self.compress {
            doc.compress();
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|err| CollateError::serialize_failed(err.to_string()))?;

        Ok(buffer)
    }
}

/// Drop the security handler from a document `lopdf` already decrypted.
///
/// Objects of an encrypted document are held in plain form after loading, so
/// saving them under the original `/Encrypt` entry would corrupt every page.
fn strip_encryption(doc: &mut Document) -> std::result::Result<(), String> {
    if !doc.is_encrypted() {
        return Ok(());
    }

    if doc.encryption_state.take().is_none() {
        return Err("document is encrypted and could not be decrypted".to_string());
    }
    doc.trailer.remove(b"Encrypt");

    Ok(())
}

/// Locate the root Pages node and check it can receive more kids.
fn root_pages_id(doc: &Document) -> std::result::Result<ObjectId, String> {
    let catalog = doc
        .catalog()
        .map_err(|err| format!("bundle catalog unreadable: {err}"))?;

    let pages_id = catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|err| format!("bundle page tree missing: {err}"))?;

    let pages = doc
        .get_dictionary(pages_id)
        .map_err(|err| format!("bundle page tree unreadable: {err}"))?;

    match pages.get(b"Kids") {
        Ok(Object::Array(_)) => Ok(pages_id),
        _ => Err("bundle page tree has no Kids array".to_string()),
    }
}

/// Hang `page_ids` under the Pages node `pages_id`.
fn attach_pages(doc: &mut Document, pages_id: ObjectId, page_ids: &[ObjectId]) {
    for &page_id in page_ids {
        if let Ok(page) = doc.get_dictionary_mut(page_id) {
            page.set("Parent", Object::Reference(pages_id));
        }
    }

    // Count may be an indirect object; the merged tree gets a direct one.
    let count = resolved_count(doc, pages_id).unwrap_or_else(|| doc.get_pages().len() as i64);

    if let Ok(pages) = doc.get_dictionary_mut(pages_id) {
        if let Ok(Object::Array(kids)) = pages.get_mut(b"Kids") {
            kids.extend(page_ids.iter().map(|&id| Object::Reference(id)));
        }

        pages.set("Count", Object::Integer(count + page_ids.len() as i64));
    }
}

fn resolved_count(doc: &Document, pages_id: ObjectId) -> Option<i64> {
    let pages = doc.get_dictionary(pages_id).ok()?;
    let (_, count) = doc.dereference(pages.get(b"Count").ok()?).ok()?;
    count.as_i64().ok()
}

/// Copy inheritable attributes from ancestors onto each page.
fn inherit_page_attributes(doc: &mut Document) {
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for page_id in page_ids {
        let inherited: Vec<(&[u8], Object)> = match doc.get_dictionary(page_id) {
            Ok(page) => INHERITABLE_KEYS
                .iter()
                .filter(|key| !page.has(key))
                .filter_map(|key| find_inherited(doc, page, key).map(|value| (*key, value)))
                .collect(),
            Err(_) => continue,
        };

        if inherited.is_empty() {
            continue;
        }

        if let Ok(page) = doc.get_dictionary_mut(page_id) {
            for (key, value) in inherited {
                page.set(key.to_vec(), value);
            }
        }
    }
}

fn find_inherited(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    None
}

/// Temporary sibling used while writing `path`.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

/// Write `bytes` to `path` atomically from the caller's point of view.
///
/// The content goes to a temporary sibling first, is flushed and synced, and
/// is then renamed onto `path`, replacing any existing file. On failure the
/// temporary file is removed and `path` is left untouched.
///
/// # Errors
///
/// Returns [`CollateError::WriteFailed`] if any step fails.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<WriteStatistics> {
    let start = Instant::now();
    let temp_path = temp_path_for(path);

    let result = write_then_rename(&temp_path, path, bytes);
    if result.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    result.map_err(|source| CollateError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(WriteStatistics {
        write_time: start.elapsed(),
        file_size: bytes.len() as u64,
        output_path: path.to_path_buf(),
    })
}

fn write_then_rename(temp_path: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file = std::fs::File::create(temp_path)?;
    let mut writer = std::io::BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    drop(writer);

    std::fs::rename(temp_path, path)
}
