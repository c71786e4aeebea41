//! Content digests and their memoized computation.
//!
//! This module provides:
//! - [`DigestFunction`]: the selectable hash (SHA-1 by default, SHA-2 family, BLAKE3)
//! - [`Digest`]: a fixed-capacity digest value
//! - [`Digester`]: streams a file through the hash once and caches the
//!   result on its [`Entry`](crate::entry::Entry)
//!
//! # Example
//!
//! ```no_run
//! use dupecmp::digest::{Digester, DigestFunction};
//! use dupecmp::entry::Entry;
//!
//! let digester = Digester::new(DigestFunction::Sha1);
//! let mut entry = Entry::new("/tmp/a.txt", 12);
//!
//! match digester.digest_of(&mut entry) {
//!     Ok(digest) => println!("{}", digest),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

pub mod hasher;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entry::{FailureStage, IoFailure};

pub use hasher::{DigestStats, Digester, DEFAULT_BUFFER_SIZE};

/// Largest digest produced by any supported function (SHA-512).
pub const MAX_DIGEST_LEN: usize = 64;

/// Hash function used for the digest stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestFunction {
    /// SHA-1, 20 bytes.
    #[default]
    Sha1,
    /// SHA-256, 32 bytes.
    Sha256,
    /// SHA-384, 48 bytes.
    Sha384,
    /// SHA-512, 64 bytes.
    Sha512,
    /// BLAKE3, 32 bytes.
    Blake3,
}

impl DigestFunction {
    /// All supported functions.
    pub const ALL: [DigestFunction; 5] = [
        DigestFunction::Sha1,
        DigestFunction::Sha256,
        DigestFunction::Sha384,
        DigestFunction::Sha512,
        DigestFunction::Blake3,
    ];

    /// Output length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            DigestFunction::Sha1 => 20,
            DigestFunction::Sha256 | DigestFunction::Blake3 => 32,
            DigestFunction::Sha384 => 48,
            DigestFunction::Sha512 => 64,
        }
    }

    /// Name as accepted on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            DigestFunction::Sha1 => "sha1",
            DigestFunction::Sha256 => "sha256",
            DigestFunction::Sha384 => "sha384",
            DigestFunction::Sha512 => "sha512",
            DigestFunction::Blake3 => "blake3",
        }
    }

    /// Digest an in-memory buffer.
    #[must_use]
    pub fn digest_bytes(self, data: &[u8]) -> Digest {
        let mut hasher = hasher::StreamHasher::new(self);
        hasher.update(data);
        hasher.finalize()
    }
}

impl fmt::Display for DigestFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown digest function name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{0} is not a supported digest function")]
pub struct UnknownDigestFunction(pub String);

impl FromStr for DigestFunction {
    type Err = UnknownDigestFunction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DigestFunction::ALL
            .into_iter()
            .find(|function| function.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownDigestFunction(s.to_string()))
    }
}

/// A computed content digest.
///
/// Stored inline; only the first `len()` bytes are meaningful and the rest
/// stay zeroed, so derived equality compares digests byte-for-byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest {
    bytes: [u8; MAX_DIGEST_LEN],
    len: u8,
}

impl Digest {
    /// Build a digest from raw bytes.
    ///
    /// Returns `None` if `bytes` is longer than [`MAX_DIGEST_LEN`].
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > MAX_DIGEST_LEN {
            return None;
        }
        let mut buf = [0u8; MAX_DIGEST_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Some(Self {
            bytes: buf,
            len: bytes.len() as u8,
        })
    }

    /// The digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Digest length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether the digest holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lowercase hexadecimal form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        use std::fmt::Write;
        self.as_bytes()
            .iter()
            .fold(String::with_capacity(self.len() * 2), |mut s, b| {
                let _ = write!(s, "{:02x}", b);
                s
            })
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// Errors from computing an entry's digest.
///
/// Cloneable so a sticky failure can be replayed on every later lookup
/// without touching the file again.
#[derive(thiserror::Error, Debug, Clone)]
pub enum DigestError {
    /// The file could not be opened.
    #[error("{path}: {source}")]
    Open {
        /// Path of the entry
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<io::Error>,
    },

    /// Reading the file failed mid-stream.
    #[error("{path}: {source}")]
    Read {
        /// Path of the entry
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<io::Error>,
    },
}

impl DigestError {
    /// Rebuild the error recorded on an invalid entry.
    pub(crate) fn from_failure(path: &Path, failure: &IoFailure) -> Self {
        let path = path.to_path_buf();
        let source = Arc::clone(&failure.source);
        match failure.stage {
            FailureStage::Open => DigestError::Open { path, source },
            FailureStage::Read => DigestError::Read { path, source },
        }
    }

    /// Path of the failing entry.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            DigestError::Open { path, .. } | DigestError::Read { path, .. } => path,
        }
    }

    /// Stage at which the failure happened.
    #[must_use]
    pub fn stage(&self) -> FailureStage {
        match self {
            DigestError::Open { .. } => FailureStage::Open,
            DigestError::Read { .. } => FailureStage::Read,
        }
    }
}
