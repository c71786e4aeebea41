//! Cluster report output.
//!
//! Each cluster is written as an optional header line followed by its paths,
//! one per record. Header formats use `%`-escapes:
//!
//! | Escape | Expands to                     |
//! |--------|--------------------------------|
//! | `%n`   | number of files in the cluster |
//! | `%i`   | 1-based cluster index          |
//! | `%s`   | file size in bytes             |
//! | `%d`   | digest in lowercase hex        |
//! | `%%`   | a literal `%`                  |
//!
//! Unknown escapes are written through unchanged.

use std::io::{self, Write};
use std::path::Path;

use crate::clusters::Cluster;

/// Default header when digests are computed.
pub const DEFAULT_HEADER: &str = "%n files in cluster %i (%s bytes, digest %d)";

/// Default header in thorough mode.
pub const DEFAULT_THOROUGH_HEADER: &str = "%n files in cluster %i (%s bytes)";

/// Errors from report configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// `%d` requested while digests are not reported.
    #[error("Digest (%d) is not calculated in thorough mode (-t)")]
    DigestInThoroughMode,
}

/// How clusters are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFormat {
    /// Header format; empty means no headers.
    pub header: String,
    /// List all but the first file of each cluster, without headers.
    pub excess: bool,
    /// Terminate records with NUL instead of newline.
    pub null_terminate: bool,
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.to_string(),
            excess: false,
            null_terminate: false,
        }
    }
}

impl ReportFormat {
    /// Build the format for a run.
    ///
    /// Without an explicit header the default for the mode is used.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::DigestInThoroughMode`] if a thorough run asks
    /// for `%d` in its header.
    pub fn new(
        header: Option<String>,
        thorough: bool,
        excess: bool,
        null_terminate: bool,
    ) -> Result<Self, ReportError> {
        let header = header.unwrap_or_else(|| {
            if thorough {
                DEFAULT_THOROUGH_HEADER.to_string()
            } else {
                DEFAULT_HEADER.to_string()
            }
        });
        if thorough && header_uses_digest(&header) {
            return Err(ReportError::DigestInThoroughMode);
        }
        Ok(Self {
            header,
            excess,
            null_terminate,
        })
    }

    fn terminator(&self) -> u8 {
        if self.null_terminate {
            b'\0'
        } else {
            b'\n'
        }
    }
}

/// Whether a header format contains the `%d` escape.
#[must_use]
pub fn header_uses_digest(format: &str) -> bool {
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.next() {
                Some('d') => return true,
                Some(_) | None => {}
            }
        }
    }
    false
}

/// Expand a header format for one cluster.
#[must_use]
pub fn format_header(format: &str, cluster: &Cluster, index: usize) -> String {
    let mut out = String::with_capacity(format.len() + 32);
    let mut chars = format.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push_str(&cluster.len().to_string()),
            Some('i') => out.push_str(&index.to_string()),
            Some('s') => out.push_str(&cluster.size.to_string()),
            Some('d') => {
                if let Some(digest) = &cluster.digest {
                    out.push_str(&digest.to_hex());
                }
            }
            Some('%') => out.push('%'),
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }

    out
}

/// Write every cluster.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_clusters<W: Write>(
    mut writer: W,
    clusters: &[Cluster],
    format: &ReportFormat,
) -> io::Result<()> {
    let terminator = format.terminator();

    for (i, cluster) in clusters.iter().enumerate() {
        if format.excess {
            for entry in cluster.entries.iter().skip(1) {
                write_record(&mut writer, entry.path(), terminator)?;
            }
            continue;
        }

        if !format.header.is_empty() {
            writer.write_all(format_header(&format.header, cluster, i + 1).as_bytes())?;
            writer.write_all(&[terminator])?;
        }
        for entry in &cluster.entries {
            write_record(&mut writer, entry.path(), terminator)?;
        }
    }

    writer.flush()
}

fn write_record<W: Write>(writer: &mut W, path: &Path, terminator: u8) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        writer.write_all(path.as_os_str().as_bytes())?;
    }
    #[cfg(not(unix))]
    {
        writer.write_all(path.to_string_lossy().as_bytes())?;
    }
    writer.write_all(&[terminator])
}
