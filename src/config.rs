//! Layered run configuration.
//!
//! Settings are merged from, lowest priority first:
//! 1. built-in defaults
//! 2. a TOML file (`--config PATH`, else `config.toml` in the platform
//!    config directory when it exists)
//! 3. `DUPECMP_*` environment variables (e.g. `DUPECMP_DIGEST=sha256`)
//! 4. command-line flags
//!
//! ```toml
//! thorough = true
//! digest = "sha256"
//! io_threads = 8
//! ignore_empty = true
//! header_format = "%n copies, %s bytes"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::compare::CompareConfig;
use crate::digest::DigestFunction;

/// Prefix of environment variables read as settings.
pub const ENV_PREFIX: &str = "DUPECMP_";

/// Errors from loading settings.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly named config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A source could not be parsed or holds invalid values.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

/// Effective settings for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Suppress warnings about unreadable files.
    pub quiet: bool,
    /// Verify digest matches byte by byte.
    pub thorough: bool,
    /// Digest function.
    pub digest: DigestFunction,
    /// Threads used for digesting.
    pub io_threads: usize,
    /// Do not report empty files.
    pub ignore_empty: bool,
    /// Cluster header format; `None` picks the default for the mode.
    pub header_format: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quiet: false,
            thorough: false,
            digest: DigestFunction::default(),
            io_threads: 4,
            ignore_empty: false,
            header_format: None,
        }
    }
}

impl Settings {
    /// Load defaults, the config file and the environment.
    ///
    /// # Errors
    ///
    /// Fails if `explicit` names a missing file, or if any source holds
    /// values that do not parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.is_file() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };
        if let Some(ref path) = file {
            log::debug!("Loading config from {}", path.display());
        }

        let settings: Settings = Self::figment(file.as_deref())
            .extract()
            .map_err(Box::new)?;
        Ok(settings.normalized())
    }

    /// The figment behind [`Settings::load`].
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Default platform-specific config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "dupecmp", "dupecmp")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line flags on top of the loaded settings.
    #[must_use]
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        self.quiet |= cli.quiet;
        self.thorough |= cli.thorough;
        self.ignore_empty |= cli.ignore_empty;
        if let Some(digest) = cli.digest {
            self.digest = digest;
        }
        if let Some(threads) = cli.io_threads {
            self.io_threads = threads;
        }
        if let Some(ref format) = cli.header_format {
            self.header_format = Some(format.clone());
        }
        self.normalized()
    }

    /// Settings handed to the comparison core.
    #[must_use]
    pub fn compare_config(&self) -> CompareConfig {
        CompareConfig::default()
            .with_quiet(self.quiet)
            .with_thorough(self.thorough)
            .with_digest(self.digest)
    }

    fn normalized(mut self) -> Self {
        self.io_threads = self.io_threads.max(1);
        self
    }
}
