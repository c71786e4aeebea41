//! Three-stage duplicate comparison.
//!
//! # Overview
//!
//! [`Comparator::compare`] decides whether two entries are duplicates by
//! looking for proof of inequality as early and as cheaply as possible:
//! 1. **Size**: different sizes can never match; nothing is opened.
//! 2. **Digest**: memoized digests of both files must be identical.
//! 3. **Content** (thorough mode only): the files must match byte for byte.
//!
//! Unreadable files are never an error at this level. They produce
//! [`Verdict::Unreadable`], a definite non-duplicate, and the run goes on.
//!
//! # Example
//!
//! ```no_run
//! use dupecmp::compare::{CompareConfig, Comparator};
//! use dupecmp::entry::Entry;
//!
//! let comparator = Comparator::new(&CompareConfig::default().with_thorough(true));
//! let mut a = Entry::new("/tmp/c", 12);
//! let mut b = Entry::new("/tmp/d", 12);
//!
//! if comparator.are_duplicates(&mut a, &mut b) {
//!     println!("{} == {}", a.path().display(), b.path().display());
//! }
//! ```

pub mod content;

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use crate::digest::{DigestFunction, Digester};
use crate::entry::Entry;
use crate::warnings::{WarningSink, Warnings};

pub use content::{contents_match, files_match, DEFAULT_BLOCK_SIZE};

/// Read-only settings for the comparison core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompareConfig {
    /// Suppress warnings about unreadable files.
    pub quiet: bool,
    /// Verify digest matches with a byte-by-byte comparison.
    pub thorough: bool,
    /// Digest function for the digest stage.
    pub digest: DigestFunction,
}

impl CompareConfig {
    /// Set quiet mode.
    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Set thorough mode.
    #[must_use]
    pub fn with_thorough(mut self, thorough: bool) -> Self {
        self.thorough = thorough;
        self
    }

    /// Set the digest function.
    #[must_use]
    pub fn with_digest(mut self, digest: DigestFunction) -> Self {
        self.digest = digest;
        self
    }
}

/// Outcome of comparing two entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Every enabled stage matched.
    Duplicate,
    /// Sizes differ.
    SizeMismatch,
    /// Digests differ.
    DigestMismatch,
    /// Digests matched but the bytes differ.
    ContentMismatch,
    /// One of the files could not be read.
    Unreadable,
}

impl Verdict {
    /// Whether the entries are duplicates.
    #[must_use]
    pub fn is_duplicate(self) -> bool {
        self == Verdict::Duplicate
    }
}

/// Opens files for the content stage.
///
/// The default reads from the filesystem. Embedders can substitute another
/// source, for instance to meter or throttle reads.
pub trait ContentSource: Send + Sync {
    /// Open `path` for a sequential read from its first byte.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;
}

/// Content source backed by the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSource;

impl ContentSource for FileSource {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(path)?))
    }
}

/// Decides whether two entries are duplicates.
pub struct Comparator {
    digester: Digester,
    thorough: bool,
    block_size: usize,
    source: Arc<dyn ContentSource>,
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comparator")
            .field("digester", &self.digester)
            .field("thorough", &self.thorough)
            .field("block_size", &self.block_size)
            .finish_non_exhaustive()
    }
}

impl Comparator {
    /// Create a comparator that logs warnings (unless quiet).
    #[must_use]
    pub fn new(config: &CompareConfig) -> Self {
        let digester = Digester::new(config.digest).with_warnings(Warnings::to_log(config.quiet));
        Self::with_digester(digester, config.thorough)
    }

    /// Create a comparator that reports warnings to `sink` (unless quiet).
    #[must_use]
    pub fn with_warning_sink(config: &CompareConfig, sink: Arc<dyn WarningSink>) -> Self {
        let digester = Digester::new(config.digest).with_warning_sink(sink, config.quiet);
        Self::with_digester(digester, config.thorough)
    }

    /// Create a comparator around an existing digester.
    #[must_use]
    pub fn with_digester(digester: Digester, thorough: bool) -> Self {
        Self {
            digester,
            thorough,
            block_size: DEFAULT_BLOCK_SIZE,
            source: Arc::new(FileSource),
        }
    }

    /// Set the content comparison block size (at least one byte).
    #[must_use]
    pub fn with_block_size(mut self, size: usize) -> Self {
        self.block_size = size.max(1);
        self
    }

    /// Read file contents for the content stage through `source`.
    #[must_use]
    pub fn with_content_source(mut self, source: Arc<dyn ContentSource>) -> Self {
        self.source = source;
        self
    }

    /// The digester used for the digest stage.
    #[must_use]
    pub fn digester(&self) -> &Digester {
        &self.digester
    }

    /// Whether byte-by-byte verification is enabled.
    #[must_use]
    pub fn is_thorough(&self) -> bool {
        self.thorough
    }

    /// Whether `a` and `b` are duplicates.
    pub fn are_duplicates(&self, a: &mut Entry, b: &mut Entry) -> bool {
        self.compare(a, b).is_duplicate()
    }

    /// Run the enabled stages and report the first one that failed.
    ///
    /// May compute and cache the digests of either entry as a side effect.
    /// `b` is left untouched when `a` turns out to be unreadable.
    pub fn compare(&self, a: &mut Entry, b: &mut Entry) -> Verdict {
        if a.size() != b.size() {
            return Verdict::SizeMismatch;
        }

        let first = match self.digester.digest_of(a) {
            Ok(digest) => *digest,
            Err(_) => return Verdict::Unreadable,
        };
        let second = match self.digester.digest_of(b) {
            Ok(digest) => *digest,
            Err(_) => return Verdict::Unreadable,
        };
        if first != second {
            return Verdict::DigestMismatch;
        }

        if self.thorough {
            return self.compare_contents(a, b);
        }

        Verdict::Duplicate
    }

    fn compare_contents(&self, a: &Entry, b: &Entry) -> Verdict {
        let open = |entry: &Entry| {
            self.source
                .open(entry.path())
                .map_err(|e| log::debug!("Cannot open {} for comparison: {}", entry.path().display(), e))
                .ok()
        };
        let (Some(first), Some(second)) = (open(a), open(b)) else {
            return Verdict::Unreadable;
        };

        match contents_match(first, second, self.block_size) {
            Ok(true) => Verdict::Duplicate,
            Ok(false) => {
                log::debug!(
                    "Digest collision: {} and {} differ in content",
                    a.path().display(),
                    b.path().display()
                );
                Verdict::ContentMismatch
            }
            Err(e) => {
                log::debug!(
                    "Content comparison of {} and {} failed: {}",
                    a.path().display(),
                    b.path().display(),
                    e
                );
                Verdict::Unreadable
            }
        }
    }
}
