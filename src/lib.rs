//! dupecmp - Duplicate File Finder
//!
//! Finds duplicate files by progressively more expensive comparisons: file
//! size, then a memoized cryptographic digest, then (in thorough mode) an
//! exact byte-for-byte comparison. Each stage only runs when the cheaper
//! ones could not prove the files different, and no file is digested twice.
//!
//! The decision core lives in [`entry`], [`digest`] and [`compare`]. The
//! remaining modules wire it into a command-line tool.

pub mod cli;
pub mod clusters;
pub mod compare;
pub mod config;
pub mod digest;
pub mod discovery;
pub mod entry;
pub mod error;
pub mod logging;
pub mod output;
pub mod warnings;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;

use crate::cli::Cli;
use crate::clusters::{find_clusters, ClusterOptions};
use crate::compare::Comparator;
use crate::config::Settings;
use crate::discovery::{read_paths, trim_trailing_slashes, Discovery};
use crate::error::ExitCode;
use crate::output::{write_clusters, ReportFormat};
use crate::warnings::Warnings;

/// Run the application, writing the report to standard output.
///
/// # Errors
///
/// Returns an error for invalid configuration, an unreadable standard input
/// or a failed report write. Unreadable candidate files are not errors.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let stdout = io::stdout();
    run_with_output(cli, stdout.lock())
}

/// Run the application, writing the report to `out`.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_with_output<W: Write>(cli: Cli, out: W) -> anyhow::Result<ExitCode> {
    let settings = Settings::load(cli.config.as_deref())?.with_overrides(&cli);
    logging::init_logging(cli.verbose, settings.quiet);
    log::debug!("Effective settings: {:?}", settings);

    let format = ReportFormat::new(
        settings.header_format.clone(),
        settings.thorough,
        cli.excess,
        cli.null_terminate,
    )?;

    let operands: Vec<PathBuf> = if cli.paths.is_empty() {
        read_paths(io::stdin().lock(), cli.null_terminate)
            .context("Failed to read paths from standard input")?
    } else {
        cli.paths.iter().map(|p| trim_trailing_slashes(p)).collect()
    };

    let warnings = Warnings::to_log(settings.quiet);
    let mut discovery = Discovery::new(cli.discovery_options(), warnings);
    discovery.add_paths(&operands);
    let (entries, discovery_stats) = discovery.finish();
    log::info!(
        "Examining {} files from {} operands",
        discovery_stats.files,
        operands.len()
    );

    let comparator = Comparator::new(&settings.compare_config());
    let options = ClusterOptions::default()
        .with_ignore_empty(settings.ignore_empty)
        .with_io_threads(settings.io_threads);
    let (clusters, stats) = find_clusters(entries, &comparator, &options);
    log::debug!("Cluster statistics: {:?}", stats);

    write_clusters(out, &clusters, &format).context("Failed to write report")?;

    Ok(ExitCode::Success)
}

