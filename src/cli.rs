//! Command-line interface definitions for dupecmp.
//!
//! Operands name files (and, with `-r`, directories) to compare. When no
//! operands are given, paths are read from standard input, one per line or
//! NUL-terminated with `-0`.
//!
//! # Example
//!
//! ```bash
//! # Report duplicates below the current directory
//! dupecmp -r .
//!
//! # Byte-for-byte verification, list only the extra copies
//! dupecmp -rte ~/Pictures
//!
//! # Feed paths from find(1)
//! find . -name '*.jpg' -print0 | dupecmp -0
//! ```

use clap::Parser;
use std::path::PathBuf;

use crate::digest::DigestFunction;
use crate::discovery::{DiscoveryOptions, SymlinkMode};

/// Find duplicate files by size, digest and (optionally) exact contents.
#[derive(Debug, Parser)]
#[command(name = "dupecmp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read and write file names terminated by a null character
    #[arg(short = '0', long = "null")]
    pub null_terminate: bool,

    /// Follow symbolic links to directories named on the command line
    #[arg(short = 'H', long, overrides_with_all = ["follow_all", "no_follow"])]
    pub follow_operands: bool,

    /// Follow all symbolic links to directories
    #[arg(short = 'L', long, overrides_with_all = ["follow_operands", "no_follow"])]
    pub follow_all: bool,

    /// Do not follow symbolic links to directories (default)
    #[arg(short = 'P', long, overrides_with_all = ["follow_operands", "follow_all"])]
    pub no_follow: bool,

    /// Include hidden files when searching recursively
    #[arg(short = 'a', long = "all")]
    pub all_files: bool,

    /// Message digest function: sha1, sha256, sha384, sha512 or blake3
    #[arg(short = 'd', long, value_name = "FUNCTION")]
    pub digest: Option<DigestFunction>,

    /// Excess mode: list all but one file from each cluster (no headers)
    #[arg(short = 'e', long)]
    pub excess: bool,

    /// Format for cluster headers (%n count, %i index, %s size, %d digest)
    ///
    /// An empty format disables headers.
    #[arg(short = 'f', long = "format", value_name = "FORMAT")]
    pub header_format: Option<String>,

    /// Physical mode: do not report multiple links to one file as duplicates
    #[arg(short = 'p', long)]
    pub physical: bool,

    /// Quiet: suppress warnings about unreadable files
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Search recursively through directory operands
    #[arg(short, long)]
    pub recursive: bool,

    /// Thorough: verify digest matches with a byte-by-byte comparison
    #[arg(short, long)]
    pub thorough: bool,

    /// Do not report empty files
    #[arg(short = 'z', long)]
    pub ignore_empty: bool,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file (TOML)
    #[arg(long, value_name = "PATH", env = "DUPECMP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of threads used for digesting
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Files or directories to examine; read from stdin when absent
    #[arg(value_name = "FILE")]
    pub paths: Vec<PathBuf>,
}

impl Cli {
    /// Symlink handling selected by `-H`, `-L` and `-P`.
    #[must_use]
    pub fn symlink_mode(&self) -> SymlinkMode {
        if self.follow_all {
            SymlinkMode::All
        } else if self.follow_operands {
            SymlinkMode::Operands
        } else {
            SymlinkMode::Never
        }
    }

    /// Discovery options selected on the command line.
    #[must_use]
    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            recursive: self.recursive,
            all_files: self.all_files,
            symlinks: self.symlink_mode(),
            physical: self.physical,
        }
    }
}
