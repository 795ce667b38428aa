//! Shared fixtures for pdfcollate integration tests.
//!
//! Documents are generated with `lopdf` at test time, so no binary fixtures
//! live in the repository.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{
    Document, EncryptionState, EncryptionVersion, Object, Permissions, Stream, dictionary,
};
use pdfcollate::config::{Config, TargetSize};
use pdfcollate::error::{CollateError, Result};
use pdfcollate::io::{
    DocumentBackend, LopdfBackend, LopdfDocument, LopdfWriter, MergeWriter,
};
use pdfcollate::report::{MemorySink, ReportSink};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Source and output directories for one run.
pub struct Workspace {
    pub source: TempDir,
    pub output: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            source: TempDir::new().unwrap(),
            output: TempDir::new().unwrap(),
        }
    }

    pub fn config(&self) -> Config {
        Config::new(self.source.path(), self.output.path())
    }

    /// Config whose target holds exactly `per_bundle` documents of `size` bytes.
    pub fn config_for(&self, size: u64, per_bundle: u64) -> Config {
        self.config()
            .with_target(TargetSize::from_bytes(size * per_bundle).unwrap())
    }

    /// Add a valid document with `pages` pages.
    pub fn add_pdf(&self, name: &str, pages: usize) -> PathBuf {
        write_pdf(self.source.path(), name, pages, 0)
    }

    /// Add a valid document padded with `padding` unreferenced bytes.
    pub fn add_padded_pdf(&self, name: &str, pages: usize, padding: usize) -> PathBuf {
        write_pdf(self.source.path(), name, pages, padding)
    }

    /// Add a document encrypted under `user_password`.
    pub fn add_encrypted_pdf(&self, name: &str, pages: usize, user_password: &str) -> PathBuf {
        let path = write_pdf(self.source.path(), name, pages, 0);
        encrypt_in_place(&path, user_password);
        path
    }

    /// Add a file with a `.pdf` name that no parser accepts.
    pub fn add_corrupt(&self, name: &str) -> PathBuf {
        let path = self.source.path().join(name);
        std::fs::write(&path, b"this file is not a PDF at all").unwrap();
        path
    }

    /// Add an arbitrary file.
    pub fn add_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.source.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// File names in the output directory, sorted.
    pub fn outputs(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.output.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output.path().join(name)
    }
}

/// Write a document whose every page is `Page N` in Helvetica.
pub fn write_pdf(dir: &Path, name: &str, pages: usize, padding: usize) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for number in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 18.into()]),
                Operation::new("Td", vec![50.into(), 750.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {number}"))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if padding > 0 {
        doc.add_object(Stream::new(dictionary! {}, vec![b' '; padding]));
    }

    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

/// Re-save the plain document at `path` encrypted with RC4 128.
pub fn encrypt_in_place(path: &Path, user_password: &str) {
    let mut doc = Document::load(path).unwrap();
    doc.trailer.set(
        "ID",
        vec![
            Object::string_literal("0123456789abcdef"),
            Object::string_literal("fedcba9876543210"),
        ],
    );

    let state = EncryptionState::try_from(EncryptionVersion::V2 {
        document: &doc,
        owner_password: "owner",
        user_password,
        key_length: 128,
        permissions: Permissions::default(),
    })
    .unwrap();
    doc.encrypt(&state).unwrap();
    doc.save(path).unwrap();
}

/// Text of page `number` in the PDF at `path`.
pub fn page_text(path: &Path, number: u32) -> String {
    Document::load(path).unwrap().extract_text(&[number]).unwrap()
}

/// Size in bytes of the file at `path`.
pub fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).unwrap().len()
}

/// Number of pages in the PDF at `path`.
pub fn page_count(path: &Path) -> usize {
    Document::load(path).unwrap().get_pages().len()
}

/// Real backend with injected append and size-probe failures by file name.
#[derive(Default)]
pub struct FlakyBackend {
    inner: LopdfBackend,
    failing_appends: HashSet<String>,
    failing_sizes: HashSet<String>,
}

impl FlakyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_append(mut self, name: &str) -> Self {
        self.failing_appends.insert(name.to_string());
        self
    }

    pub fn fail_size(mut self, name: &str) -> Self {
        self.failing_sizes.insert(name.to_string());
        self
    }
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub struct FlakyWriter {
    inner: LopdfWriter,
    failing: HashSet<String>,
}

impl MergeWriter for FlakyWriter {
    fn append(&mut self, path: &Path) -> Result<usize> {
        if self.failing.contains(&name_of(path)) {
            return Err(CollateError::append_failed(
                path.to_path_buf(),
                "injected append failure",
            ));
        }
        self.inner.append(path)
    }

    fn document_count(&self) -> usize {
        self.inner.document_count()
    }

    fn serialize(&mut self) -> Result<Vec<u8>> {
        self.inner.serialize()
    }
}

impl DocumentBackend for FlakyBackend {
    type Document = LopdfDocument;
    type Writer = FlakyWriter;

    fn open(&self, path: &Path) -> Result<LopdfDocument> {
        self.inner.open(path)
    }

    fn writer(&self) -> FlakyWriter {
        FlakyWriter {
            inner: self.inner.writer(),
            failing: self.failing_appends.clone(),
        }
    }

    fn byte_size(&self, path: &Path) -> std::io::Result<u64> {
        if self.failing_sizes.contains(&name_of(path)) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "injected size failure",
            ));
        }
        self.inner.byte_size(path)
    }
}

/// Sink that cancels the run when a log line contains a marker.
pub struct CancelOn {
    pub sink: MemorySink,
    marker: String,
    cancel: CancellationToken,
}

impl CancelOn {
    pub fn new(marker: &str, cancel: CancellationToken) -> Self {
        Self {
            sink: MemorySink::new(),
            marker: marker.to_string(),
            cancel,
        }
    }
}

impl ReportSink for CancelOn {
    fn log(&self, line: &str) {
        self.sink.log(line);
        if line.contains(&self.marker) {
            self.cancel.cancel();
        }
    }

    fn status(&self, message: &str) {
        self.sink.status(message);
    }

    fn started(&self) {
        self.sink.started();
    }

    fn finished(&self) {
        self.sink.finished();
    }
}
