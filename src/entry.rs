//! Candidate file records.
//!
//! # Overview
//!
//! An [`Entry`] is one file under duplicate consideration: its path, its
//! size and the state of its digest. The digest state is an explicit tagged
//! variant ([`EntryStatus`]), so an entry that failed I/O can never carry a
//! stale digest and an untouched entry can never be mistaken for a hashed one.
//!
//! Entries are plain owned values. Dropping an entry releases it, dropping
//! (or clearing) a `Vec<Entry>` releases every entry it holds.
//!
//! # Example
//!
//! ```
//! use dupecmp::entry::{Entry, EntryStatus};
//!
//! let entry = Entry::new("/tmp/a.txt", 12);
//! assert_eq!(entry.size(), 12);
//! assert!(matches!(entry.status(), EntryStatus::Untouched));
//!
//! // Cloning snapshots the current state, digest included.
//! let snapshot = entry.clone();
//! assert_eq!(snapshot.path(), entry.path());
//! ```

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::digest::Digest;

/// Where an entry's I/O failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// The file could not be opened for reading.
    Open,
    /// Reading failed part way through the file.
    Read,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Open => write!(f, "open"),
            FailureStage::Read => write!(f, "read"),
        }
    }
}

/// The recorded cause of an entry becoming invalid.
///
/// The OS error is shared, so cloning an invalid entry (or replaying its
/// failure) never needs to touch the filesystem again.
#[derive(Debug, Clone)]
pub struct IoFailure {
    /// Stage at which the failure happened.
    pub stage: FailureStage,
    /// The underlying OS error.
    pub source: Arc<io::Error>,
}

impl IoFailure {
    /// Record a failure at the given stage.
    #[must_use]
    pub fn new(stage: FailureStage, source: io::Error) -> Self {
        Self {
            stage,
            source: Arc::new(source),
        }
    }
}

/// Digest state of an entry.
///
/// Moves from `Untouched` to exactly one of the terminal states and never
/// leaves it again.
#[derive(Debug, Clone)]
pub enum EntryStatus {
    /// No digest has been attempted yet.
    Untouched,
    /// The full-content digest is known.
    Digested(Digest),
    /// Reading the file failed; the entry matches nothing.
    Invalid(IoFailure),
}

/// One candidate file.
#[derive(Debug, Clone)]
pub struct Entry {
    path: PathBuf,
    size: u64,
    status: EntryStatus,
}

impl Entry {
    /// Create an untouched entry.
    ///
    /// # Arguments
    ///
    /// * `path` - Path of the file, copied into the entry
    /// * `size` - File size in bytes as reported by discovery
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
            status: EntryStatus::Untouched,
        }
    }

    /// Create an entry whose digest is already known.
    ///
    /// The digest is trusted as-is; no file is read to confirm it.
    #[must_use]
    pub fn digested(path: impl Into<PathBuf>, size: u64, digest: Digest) -> Self {
        Self {
            path: path.into(),
            size,
            status: EntryStatus::Digested(digest),
        }
    }

    /// Path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the file in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Current digest state.
    #[must_use]
    pub fn status(&self) -> &EntryStatus {
        &self.status
    }

    /// The cached digest, if one has been computed.
    #[must_use]
    pub fn digest(&self) -> Option<&Digest> {
        match &self.status {
            EntryStatus::Digested(digest) => Some(digest),
            _ => None,
        }
    }

    /// Whether no digest has been attempted yet.
    #[must_use]
    pub fn is_untouched(&self) -> bool {
        matches!(self.status, EntryStatus::Untouched)
    }

    /// Whether the entry failed I/O and is barred from matching.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self.status, EntryStatus::Invalid(_))
    }

    /// Leave `Untouched` for a terminal state.
    ///
    /// Only the digester drives this transition. A terminal state is never
    /// overwritten.
    pub(crate) fn settle(&mut self, status: EntryStatus) {
        debug_assert!(
            self.is_untouched(),
            "entry {} already settled",
            self.path.display()
        );
        if self.is_untouched() {
            self.status = status;
        }
    }
}
