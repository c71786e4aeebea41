//! Turning path operands into entries.
//!
//! # Overview
//!
//! [`Discovery`] takes the paths named on the command line (or read from
//! standard input) and produces one [`Entry`] per regular file, with the
//! size taken from its metadata. Directories are descended into with
//! walkdir when recursion is enabled and skipped with a warning otherwise.
//!
//! Unreadable paths are reported through the shared [`Warnings`] channel and
//! never stop discovery.
//!
//! # Example
//!
//! ```no_run
//! use dupecmp::discovery::{Discovery, DiscoveryOptions};
//! use dupecmp::warnings::Warnings;
//! use std::path::Path;
//!
//! let options = DiscoveryOptions {
//!     recursive: true,
//!     ..Default::default()
//! };
//! let mut discovery = Discovery::new(options, Warnings::to_log(false));
//! discovery.add_path(Path::new("."));
//! let (entries, stats) = discovery.finish();
//! println!("{} files, {} errors", entries.len(), stats.errors);
//! ```

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs::{self, Metadata};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::entry::Entry;
use crate::warnings::Warnings;

/// How symbolic links to directories are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SymlinkMode {
    /// Never follow symlinks to directories.
    #[default]
    Never,
    /// Follow symlinks named as operands only.
    Operands,
    /// Follow every symlink to a directory.
    All,
}

/// Options controlling discovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Descend into directory operands.
    pub recursive: bool,
    /// Include dotfiles found while descending.
    pub all_files: bool,
    /// Symlink handling.
    pub symlinks: SymlinkMode,
    /// Keep only the first path seen for each physical file.
    pub physical: bool,
}

/// Counters from a discovery run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    /// Entries produced
    pub files: usize,
    /// Directories descended into
    pub directories: usize,
    /// Paths skipped as extra links to an already seen file
    pub skipped_links: usize,
    /// Paths that could not be examined
    pub errors: usize,
}

/// Collects entries from path operands.
#[derive(Debug)]
pub struct Discovery {
    options: DiscoveryOptions,
    warnings: Warnings,
    seen: HashSet<InodeKey>,
    entries: Vec<Entry>,
    stats: DiscoveryStats,
}

impl Discovery {
    /// Create an empty discovery run.
    #[must_use]
    pub fn new(options: DiscoveryOptions, warnings: Warnings) -> Self {
        Self {
            options,
            warnings,
            seen: HashSet::new(),
            entries: Vec::new(),
            stats: DiscoveryStats::default(),
        }
    }

    /// Process one operand.
    pub fn add_path(&mut self, path: &Path) {
        let link_meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) => return self.fail(path, &e),
        };
        let meta = if link_meta.file_type().is_symlink() {
            match fs::metadata(path) {
                Ok(meta) => meta,
                Err(e) => return self.fail(path, &e),
            }
        } else {
            link_meta.clone()
        };

        if meta.is_dir() {
            if link_meta.file_type().is_symlink() && self.options.symlinks == SymlinkMode::Never {
                self.warnings.emit(path, &"is a symbolic link to a directory (use -H or -L to follow)");
                return;
            }
            if !self.options.recursive {
                self.warnings.emit(path, &"is a directory");
                return;
            }
            self.walk(path);
        } else if meta.is_file() {
            self.push(path.to_path_buf(), &meta);
        } else {
            log::debug!("Skipping special file {}", path.display());
        }
    }

    /// Process every operand in order.
    pub fn add_paths<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            self.add_path(path.as_ref());
        }
    }

    /// Entries found so far and the run's counters.
    #[must_use]
    pub fn finish(self) -> (Vec<Entry>, DiscoveryStats) {
        log::debug!(
            "Discovered {} files in {} directories ({} errors)",
            self.stats.files,
            self.stats.directories,
            self.stats.errors
        );
        (self.entries, self.stats)
    }

    fn walk(&mut self, root: &Path) {
        self.stats.directories += 1;
        let all_files = self.options.all_files;
        let walker = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .follow_links(self.options.symlinks == SymlinkMode::All)
            .into_iter()
            .filter_entry(move |e| all_files || !is_hidden(e.file_name()));

        for item in walker {
            let dent = match item {
                Ok(dent) => dent,
                Err(e) => {
                    let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                    self.fail(&path, &e);
                    continue;
                }
            };

            let file_type = dent.file_type();
            if file_type.is_dir() {
                self.stats.directories += 1;
                continue;
            }

            // Symlinks that walkdir did not follow: keep the ones naming files.
            let meta = if file_type.is_symlink() {
                fs::metadata(dent.path())
            } else {
                dent.metadata().map_err(io::Error::from)
            };
            match meta {
                Ok(meta) if meta.is_file() => self.push(dent.into_path(), &meta),
                Ok(_) => {}
                Err(e) => self.fail(dent.path(), &e),
            }
        }
    }

    fn push(&mut self, path: PathBuf, meta: &Metadata) {
        if self.options.physical {
            if let Some(key) = InodeKey::from_metadata(meta) {
                if !self.seen.insert(key) {
                    log::debug!("Skipping extra link {}", path.display());
                    self.stats.skipped_links += 1;
                    return;
                }
            }
        }
        log::trace!("Found {} ({} bytes)", path.display(), meta.len());
        self.stats.files += 1;
        self.entries.push(Entry::new(path, meta.len()));
    }

    fn fail(&mut self, path: &Path, cause: &dyn std::fmt::Display) {
        self.stats.errors += 1;
        self.warnings.emit(path, cause);
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

/// Physical file identity: (device, inode) on Unix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct InodeKey {
    dev: u64,
    ino: u64,
}

impl InodeKey {
    #[cfg(unix)]
    fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

/// Strip trailing path separators, keeping a lone root intact.
///
/// Works on the raw path bytes on Unix, so names that are not valid UTF-8
/// come through unchanged.
#[must_use]
pub fn trim_trailing_slashes(path: &Path) -> PathBuf {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        let bytes = path.as_os_str().as_bytes();
        let end = bytes
            .iter()
            .rposition(|&b| b != b'/')
            .map_or(bytes.len().min(1), |i| i + 1);
        PathBuf::from(OsStr::from_bytes(&bytes[..end]))
    }
    #[cfg(not(unix))]
    {
        match path.to_str() {
            Some(text) => {
                let trimmed = text.trim_end_matches(std::path::is_separator);
                if trimmed.is_empty() && !text.is_empty() {
                    PathBuf::from(&text[..1])
                } else {
                    PathBuf::from(trimmed)
                }
            }
            None => path.components().collect(),
        }
    }
}

/// Path named by one raw input record.
#[cfg(unix)]
fn path_from_record(record: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    trim_trailing_slashes(Path::new(OsStr::from_bytes(record)))
}

#[cfg(not(unix))]
fn path_from_record(record: &[u8]) -> PathBuf {
    trim_trailing_slashes(Path::new(&*String::from_utf8_lossy(record)))
}

/// Read operands from a stream, one per line or NUL-terminated.
///
/// Empty records are skipped.
///
/// # Errors
///
/// Returns any read error from the stream.
pub fn read_paths<R: BufRead>(mut reader: R, null_terminated: bool) -> io::Result<Vec<PathBuf>> {
    let delimiter = if null_terminated { b'\0' } else { b'\n' };
    let mut paths = Vec::new();
    let mut record = Vec::new();

    loop {
        record.clear();
        if reader.read_until(delimiter, &mut record)? == 0 {
            break;
        }
        if record.last() == Some(&delimiter) {
            record.pop();
        }
        if !null_terminated && record.last() == Some(&b'\r') {
            record.pop();
        }
        if record.is_empty() {
            continue;
        }
        paths.push(path_from_record(&record));
    }

    Ok(paths)
}
