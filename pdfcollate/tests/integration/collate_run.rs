//! Full runs against generated documents.

use pdfcollate::io::{LopdfBackend, temp_path_for};
use pdfcollate::pipeline::Collator;
use pdfcollate::report::{BundleStatus, MemorySink};
use rstest::rstest;
use tokio_util::sync::CancellationToken;

use crate::common::{Workspace, file_size, page_count, page_text};
use lopdf::Document;

fn run(ws: &Workspace, config: pdfcollate::Config) -> (pdfcollate::RunResult, MemorySink) {
    let sink = MemorySink::new();
    let result = Collator::new(config, LopdfBackend::new())
        .run(&sink, &CancellationToken::new())
        .unwrap();
    assert!(
        ws.outputs().iter().all(|name| !name.ends_with(".tmp")),
        "no temporary files left behind"
    );
    (result, sink)
}

#[rstest]
#[case(1, vec![vec!["a.pdf"], vec!["b.pdf"], vec!["c.pdf"], vec!["d.pdf"], vec!["e.pdf"]])]
#[case(2, vec![vec!["a.pdf", "b.pdf"], vec!["c.pdf", "d.pdf"], vec!["e.pdf"]])]
#[case(3, vec![vec!["a.pdf", "b.pdf", "c.pdf"], vec!["d.pdf", "e.pdf"]])]
#[case(5, vec![vec!["a.pdf", "b.pdf", "c.pdf", "d.pdf", "e.pdf"]])]
fn test_bundles_follow_target(#[case] per_bundle: u64, #[case] expected: Vec<Vec<&str>>) {
    let ws = Workspace::new();
    for name in ["e.pdf", "c.pdf", "a.pdf", "d.pdf", "b.pdf"] {
        ws.add_padded_pdf(name, 2, 2048);
    }
    let size = file_size(&ws.source.path().join("a.pdf"));

    let (result, _) = run(&ws, ws.config_for(size, per_bundle));

    let membership: Vec<Vec<String>> = result.bundles.iter().map(|b| b.documents.clone()).collect();
    assert_eq!(membership, expected);
    assert_eq!(result.processed, 5);
    assert_eq!(ws.outputs().len(), expected.len());

    for bundle in &result.bundles {
        assert!(matches!(bundle.status, BundleStatus::Written { .. }));
        assert_eq!(page_count(&bundle.path), bundle.documents.len() * 2);
        assert!(bundle.input_bytes <= size * per_bundle);
    }
}

#[test]
fn test_oversized_document_gets_own_bundle() {
    let ws = Workspace::new();
    let small = ws.add_padded_pdf("a.pdf", 1, 1024);
    ws.add_padded_pdf("b.pdf", 1, 64 * 1024);
    ws.add_padded_pdf("c.pdf", 1, 1024);

    let size = file_size(&small);
    let (result, _) = run(&ws, ws.config_for(size, 3));

    let membership: Vec<Vec<String>> = result.bundles.iter().map(|b| b.documents.clone()).collect();
    assert_eq!(membership, vec![vec!["a.pdf"], vec!["b.pdf"], vec!["c.pdf"]]);
    assert!(result.bundles[1].input_bytes > size * 3);
}

#[test]
fn test_only_top_level_pdfs_are_collected() {
    let ws = Workspace::new();
    ws.add_pdf("a.pdf", 1);
    ws.add_pdf("B.PDF", 1);
    ws.add_file("notes.txt", b"not a candidate");
    ws.add_file("pdf", b"no extension");
    std::fs::create_dir(ws.source.path().join("nested.pdf")).unwrap();
    crate::common::write_pdf(&ws.source.path().join("nested.pdf"), "inner.pdf", 1, 0);

    let (result, _) = run(&ws, ws.config());

    assert_eq!(result.processed, 2);
    // Byte order: uppercase sorts before lowercase.
    assert_eq!(result.bundles[0].documents, vec!["B.PDF", "a.pdf"]);
}

#[test]
fn test_runs_are_repeatable() {
    let ws = Workspace::new();
    for name in ["a.pdf", "b.pdf", "c.pdf"] {
        ws.add_padded_pdf(name, 1, 4096);
    }
    let size = file_size(&ws.source.path().join("a.pdf"));

    let (first, _) = run(&ws, ws.config_for(size, 2));
    let (second, _) = run(&ws, ws.config_for(size, 2));

    assert_eq!(first.bundles.len(), second.bundles.len());
    for (a, b) in first.bundles.iter().zip(&second.bundles) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.documents, b.documents);
    }
    assert_eq!(ws.outputs(), vec!["Collated_Part_001.pdf", "Collated_Part_002.pdf"]);
    assert!(!temp_path_for(&ws.output_path("Collated_Part_001.pdf")).exists());
}

#[test]
fn test_log_follows_both_phases() {
    let ws = Workspace::new();
    ws.add_pdf("a.pdf", 1);
    ws.add_corrupt("b.pdf");
    ws.add_pdf("c.pdf", 1);

    let (result, sink) = run(&ws, ws.config());
    let lines = sink.lines();

    let position = |needle: &str| {
        lines
            .iter()
            .position(|line| line.contains(needle))
            .unwrap_or_else(|| panic!("missing log line: {needle}"))
    };

    assert!(position("Scanning ") < position("Phase 1:"));
    assert!(position("Phase 1:") < position(" >> EXCLUDED: b.pdf (Corrupt:"));
    assert!(position("--- EXCLUSION REPORT ---") < position("Phase 2: Collating 2 files..."));
    assert!(position("Writing Collated_Part_001.pdf (2 files)...") < position("Saved: Collated_Part_001.pdf"));

    assert_eq!(result.excluded_names(), vec!["b.pdf"]);
    assert!(result.excluded[0].reason.starts_with("Corrupt:"));
    assert_eq!(result.bundles[0].documents, vec!["a.pdf", "c.pdf"]);
    assert_eq!(sink.signals(), (1, 1));
    assert_eq!(
        sink.statuses(),
        vec!["Scanning: 1/3...", "Collating: 1/2..."]
    );
}

#[test]
fn test_existing_bundles_are_replaced() {
    let ws = Workspace::new();
    ws.add_pdf("a.pdf", 3);
    std::fs::write(ws.output_path("Collated_Part_001.pdf"), b"stale").unwrap();

    let (result, _) = run(&ws, ws.config());

    assert_eq!(result.bundle_count(), 1);
    assert_eq!(page_count(&ws.output_path("Collated_Part_001.pdf")), 3);
}

#[test]
fn test_encrypted_documents_merge_readably() {
    let ws = Workspace::new();
    ws.add_encrypted_pdf("a.pdf", 2, "");
    ws.add_pdf("b.pdf", 1);
    ws.add_encrypted_pdf("c.pdf", 1, "secret");
    ws.add_encrypted_pdf("d.pdf", 1, "");

    let (result, sink) = run(&ws, ws.config());

    assert_eq!(result.processed, 3);
    assert_eq!(result.excluded_count(), 1);
    assert_eq!(result.excluded[0].name, "c.pdf");
    assert!(sink.contains(" >> EXCLUDED: c.pdf (Locked:"));

    assert_eq!(result.bundle_count(), 1);
    let bundle = &result.bundles[0];
    assert_eq!(bundle.documents, vec!["a.pdf", "b.pdf", "d.pdf"]);
    assert!(!Document::load(&bundle.path).unwrap().is_encrypted());
    assert_eq!(page_count(&bundle.path), 4);

    let texts: Vec<String> = (1..=4).map(|number| page_text(&bundle.path, number)).collect();
    for (text, expected) in texts.iter().zip(["Page 1", "Page 2", "Page 1", "Page 1"]) {
        assert!(text.contains(expected), "{text:?} should contain {expected:?}");
    }
}
