//! Phase 2: greedy, single-pass packing of usable documents into bundles.
//!
//! The packer never looks ahead and never reorders. A bundle closes as soon
//! as the next document would push it past the target, so every bundle
//! stays within the target except one holding a single oversized document.

use crate::config::{BundleName, TargetSize};
use crate::discovery::Candidate;

/// A document assigned to a bundle, with the size it was packed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedDocument {
    /// The assigned candidate.
    pub candidate: Candidate,

    /// Byte size probed when the candidate was packed.
    pub size: u64,
}

/// A closed bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    index: usize,
    documents: Vec<PackedDocument>,
    total_bytes: u64,
}

impl Bundle {
    /// 1-based sequence index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Output name derived from the index.
    pub fn name(&self) -> BundleName {
        BundleName::new(self.index)
    }

    /// Assigned documents, in order.
    pub fn documents(&self) -> &[PackedDocument] {
        &self.documents
    }

    /// Sum of the assigned documents' sizes.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Number of assigned documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// A closed bundle always holds at least one document.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Names of the assigned documents.
    pub fn document_names(&self) -> Vec<String> {
        self.documents
            .iter()
            .map(|doc| doc.candidate.name.clone())
            .collect()
    }
}

/// State of the bundle currently being filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackerState {
    /// No document assigned yet.
    Empty,
    /// Accepting documents.
    Accumulating {
        /// Documents assigned so far.
        documents: usize,
        /// Running byte total.
        bytes: u64,
    },
}

/// Streaming bin packer.
///
/// Feed documents with [`Packer::push`]; each call returns the previous
/// bundle when the new document forced it closed. Call [`Packer::finish`] to
/// close the trailing bundle.
#[derive(Debug)]
pub struct Packer {
    target: u64,
    current: Vec<PackedDocument>,
    current_bytes: u64,
    next_index: usize,
}

impl Packer {
    /// Create a packer for the given target size.
    pub fn new(target: TargetSize) -> Self {
        Self {
            target: target.bytes(),
            current: Vec::new(),
            current_bytes: 0,
            next_index: 1,
        }
    }

    /// State of the open bundle.
    pub fn state(&self) -> PackerState {
        if self.current.is_empty() {
            PackerState::Empty
        } else {
            PackerState::Accumulating {
                documents: self.current.len(),
                bytes: self.current_bytes,
            }
        }
    }

    /// Index the next closed bundle will receive.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Check whether adding `size` bytes would close the open bundle first.
    pub fn would_overflow(&self, size: u64) -> bool {
        !self.current.is_empty() && self.current_bytes.saturating_add(size) > self.target
    }

    /// Assign a document, closing the open bundle first if it would overflow.
    pub fn push(&mut self, candidate: Candidate, size: u64) -> Option<Bundle> {
        let closed = if self.would_overflow(size) {
            self.close()
        } else {
            None
        };

        self.current.push(PackedDocument { candidate, size });
        self.current_bytes = self.current_bytes.saturating_add(size);

        closed
    }

    /// Close the trailing bundle, if any document is pending.
    pub fn finish(mut self) -> Option<Bundle> {
        self.close()
    }

    fn close(&mut self) -> Option<Bundle> {
        if self.current.is_empty() {
            return None;
        }

        let bundle = Bundle {
            index: self.next_index,
            documents: std::mem::take(&mut self.current),
            total_bytes: std::mem::replace(&mut self.current_bytes, 0),
        };
        self.next_index += 1;

        Some(bundle)
    }
}

/// Pack a full sequence of sized documents at once.
pub fn plan_bundles<I>(documents: I, target: TargetSize) -> Vec<Bundle>
where
    I: IntoIterator<Item = (Candidate, u64)>,
{
    let mut packer = Packer::new(target);
    let mut bundles = Vec::new();

    for (candidate, size) in documents {
        if let Some(bundle) = packer.push(candidate, size) {
            bundles.push(bundle);
        }
    }
    bundles.extend(packer.finish());

    bundles
}
