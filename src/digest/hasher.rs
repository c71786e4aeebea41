//! Streaming, memoizing file digester.
//!
//! # Overview
//!
//! [`Digester::digest_of`] computes an entry's digest at most once. The
//! file is streamed through the hash in fixed-size chunks so memory use does
//! not depend on file size, and the handle is closed on every exit path.
//! Failures are sticky: the entry becomes invalid, one warning is emitted,
//! and every later lookup replays the recorded error without touching disk.
//!
//! [`Digester::digest_all`] digests many entries on the caller's rayon pool.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use sha2::Digest as _;

use super::{Digest, DigestError, DigestFunction};
use crate::entry::{Entry, EntryStatus, FailureStage, IoFailure};
use crate::warnings::{WarningSink, Warnings};

/// Read buffer size used while digesting (8 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Incremental state for any supported digest function.
pub(crate) enum StreamHasher {
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
    Sha384(sha2::Sha384),
    Sha512(sha2::Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl StreamHasher {
    pub(crate) fn new(function: DigestFunction) -> Self {
        match function {
            DigestFunction::Sha1 => StreamHasher::Sha1(sha1::Sha1::new()),
            DigestFunction::Sha256 => StreamHasher::Sha256(sha2::Sha256::new()),
            DigestFunction::Sha384 => StreamHasher::Sha384(sha2::Sha384::new()),
            DigestFunction::Sha512 => StreamHasher::Sha512(sha2::Sha512::new()),
            DigestFunction::Blake3 => StreamHasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    pub(crate) fn update(&mut self, data: &[u8]) {
        match self {
            StreamHasher::Sha1(h) => h.update(data),
            StreamHasher::Sha256(h) => h.update(data),
            StreamHasher::Sha384(h) => h.update(data),
            StreamHasher::Sha512(h) => h.update(data),
            StreamHasher::Blake3(h) => {
                h.update(data);
            }
        }
    }

    pub(crate) fn finalize(self) -> Digest {
        // Every supported output fits in MAX_DIGEST_LEN.
        let digest = match self {
            StreamHasher::Sha1(h) => Digest::from_bytes(&h.finalize()),
            StreamHasher::Sha256(h) => Digest::from_bytes(&h.finalize()),
            StreamHasher::Sha384(h) => Digest::from_bytes(&h.finalize()),
            StreamHasher::Sha512(h) => Digest::from_bytes(&h.finalize()),
            StreamHasher::Blake3(h) => Digest::from_bytes(h.finalize().as_bytes()),
        };
        digest.unwrap_or_else(|| unreachable!("digest output exceeds MAX_DIGEST_LEN"))
    }
}

/// I/O counters of a [`Digester`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigestStats {
    /// Files opened for digesting
    pub files_opened: usize,
    /// Entries that reached the digested state
    pub files_digested: usize,
    /// Entries that became invalid
    pub failures: usize,
    /// Total bytes fed through the hash
    pub bytes_hashed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    files_opened: AtomicUsize,
    files_digested: AtomicUsize,
    failures: AtomicUsize,
    bytes_hashed: AtomicU64,
}

/// Computes and memoizes entry digests.
#[derive(Debug)]
pub struct Digester {
    function: DigestFunction,
    warnings: Warnings,
    buffer_size: usize,
    counters: Counters,
}

impl Default for Digester {
    fn default() -> Self {
        Self::new(DigestFunction::default())
    }
}

impl Digester {
    /// Create a digester that logs warnings.
    #[must_use]
    pub fn new(function: DigestFunction) -> Self {
        Self {
            function,
            warnings: Warnings::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            counters: Counters::default(),
        }
    }

    /// Replace the warning channel.
    #[must_use]
    pub fn with_warnings(mut self, warnings: Warnings) -> Self {
        self.warnings = warnings;
        self
    }

    /// Send warnings to `sink` unless `quiet`.
    #[must_use]
    pub fn with_warning_sink(self, sink: Arc<dyn WarningSink>, quiet: bool) -> Self {
        self.with_warnings(Warnings::new(sink, quiet))
    }

    /// Set the read buffer size (at least one byte).
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// The configured digest function.
    #[must_use]
    pub fn function(&self) -> DigestFunction {
        self.function
    }

    /// The warning channel in use.
    #[must_use]
    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    /// Snapshot of the I/O counters.
    #[must_use]
    pub fn stats(&self) -> DigestStats {
        DigestStats {
            files_opened: self.counters.files_opened.load(Ordering::Relaxed),
            files_digested: self.counters.files_digested.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            bytes_hashed: self.counters.bytes_hashed.load(Ordering::Relaxed),
        }
    }

    /// Return the entry's digest, computing it on first use.
    ///
    /// - `Digested`: the cached digest, no I/O.
    /// - `Invalid`: the recorded error, no I/O and no new warning.
    /// - `Untouched`: streams the file; on failure the entry becomes invalid
    ///   and a warning is emitted.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Open`] or [`DigestError::Read`] when the entry
    /// is, or just became, invalid.
    pub fn digest_of<'e>(&self, entry: &'e mut Entry) -> Result<&'e Digest, DigestError> {
        if entry.is_untouched() {
            let status = match self.digest_file(entry.path()) {
                Ok(digest) => {
                    self.counters.files_digested.fetch_add(1, Ordering::Relaxed);
                    log::trace!("Digested {}: {}", entry.path().display(), digest);
                    EntryStatus::Digested(digest)
                }
                Err(failure) => {
                    self.counters.failures.fetch_add(1, Ordering::Relaxed);
                    log::debug!(
                        "Digest {} failed for {}: {}",
                        failure.stage,
                        entry.path().display(),
                        failure.source
                    );
                    self.warnings.emit(entry.path(), &failure.source);
                    EntryStatus::Invalid(failure)
                }
            };
            entry.settle(status);
        }

        match entry.status() {
            EntryStatus::Digested(digest) => Ok(digest),
            EntryStatus::Invalid(failure) => Err(DigestError::from_failure(entry.path(), failure)),
            EntryStatus::Untouched => unreachable!("entry settled above"),
        }
    }

    /// Digest every untouched entry in parallel.
    ///
    /// Runs on the rayon pool of the caller: inside `ThreadPool::install`
    /// that pool, otherwise the global one. Each entry is reached through
    /// its own exclusive borrow, so no entry is digested twice and no thread
    /// sees a half-written status. Returns the number of entries holding a
    /// digest afterwards.
    pub fn digest_all(&self, entries: &mut [Entry]) -> usize {
        let pending = entries.iter().filter(|e| e.is_untouched()).count();
        if pending > 0 {
            log::debug!(
                "Digesting {} entries on {} threads",
                pending,
                rayon::current_num_threads()
            );
            entries
                .par_iter_mut()
                .filter(|entry| entry.is_untouched())
                .for_each(|entry| {
                    let _ = self.digest_of(entry);
                });
        }

        entries.iter().filter(|e| e.digest().is_some()).count()
    }

    /// Stream any reader through the configured hash.
    ///
    /// # Errors
    ///
    /// Returns the first read error; `Interrupted` reads are retried.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> io::Result<Digest> {
        let mut hasher = StreamHasher::new(self.function);
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..n]);
            self.counters
                .bytes_hashed
                .fetch_add(n as u64, Ordering::Relaxed);
        }

        Ok(hasher.finalize())
    }

    fn digest_file(&self, path: &Path) -> Result<Digest, IoFailure> {
        let file = File::open(path).map_err(|e| IoFailure::new(FailureStage::Open, e))?;
        self.counters.files_opened.fetch_add(1, Ordering::Relaxed);
        self.digest_reader(file)
            .map_err(|e| IoFailure::new(FailureStage::Read, e))
    }
}
