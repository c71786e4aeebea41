//! Process exit codes.

use crate::config::ConfigError;
use crate::output::ReportError;

/// Exit codes for the dupecmp binary.
///
/// - 0: Success (completed normally; unreadable files only produce warnings)
/// - 1: General error (unexpected failure, e.g. writing the report)
/// - 2: Usage error (invalid configuration or header format)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// The run completed.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Configuration or options were invalid.
    UsageError = 2,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DC000",
            Self::GeneralError => "DC001",
            Self::UsageError => "DC002",
        }
    }

    /// Classify an error returned by [`crate::run_app`].
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err.downcast_ref::<ConfigError>().is_some() || err.downcast_ref::<ReportError>().is_some() {
            Self::UsageError
        } else {
            Self::GeneralError
        }
    }
}
