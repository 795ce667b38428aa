//! Helpers shared by unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{Document, EncryptionState, EncryptionVersion, Object, Permissions, Stream, dictionary};
use std::path::{Path, PathBuf};

/// Build a document with `pages` text pages and `padding` extra bytes.
///
/// Resources and MediaBox live on the Pages node so appends must carry
/// inherited attributes over.
pub(crate) fn build_test_document(pages: usize, padding: usize) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages);
    for number in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {number}"))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if padding > 0 {
        doc.add_object(Stream::new(dictionary! {}, vec![b'%'; padding]));
    }

    doc
}

/// Write a test PDF with `pages` pages into `dir`.
pub(crate) fn write_test_pdf(dir: &Path, name: &str, pages: usize) -> PathBuf {
    write_padded_pdf(dir, name, pages, 0)
}

/// Write a test PDF with `pages` pages and `padding` filler bytes into `dir`.
pub(crate) fn write_padded_pdf(dir: &Path, name: &str, pages: usize, padding: usize) -> PathBuf {
    let path = dir.join(name);
    build_test_document(pages, padding).save(&path).unwrap();
    path
}

/// Write a test PDF encrypted with RC4 128 under `user_password`.
///
/// An empty user password gives a document any reader can open.
pub(crate) fn write_encrypted_pdf(
    dir: &Path,
    name: &str,
    pages: usize,
    user_password: &str,
) -> PathBuf {
    let mut doc = build_test_document(pages, 0);
    doc.trailer.set(
        "ID",
        vec![
            Object::string_literal("pdfcollate-id-01"),
            Object::string_literal("pdfcollate-id-02"),
        ],
    );

    let version = EncryptionVersion::V2 {
        document: &doc,
        owner_password: "owner",
        user_password,
        key_length: 128,
        permissions: Permissions::default(),
    };
    let state = EncryptionState::try_from(version).unwrap();
    doc.encrypt(&state).unwrap();

    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}
