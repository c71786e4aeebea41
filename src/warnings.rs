//! Side-channel warnings for unreadable files.
//!
//! I/O failures never abort a run. Instead they are reported once as a
//! human-readable `"<path>: <cause>"` line to a [`WarningSink`], and the
//! affected file simply stops taking part in matching. The default sink
//! forwards to the `log` facade; tests and embedders can collect the
//! messages instead.
//!
//! The `quiet` setting suppresses emission entirely; the sink is never
//! called while quiet.

use std::fmt::Display;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Receiver for warning messages.
///
/// Implementations must be shareable across the digesting threads.
pub trait WarningSink: Send + Sync {
    /// Called once per warning with the fully formatted message.
    fn warn(&self, message: &str);
}

/// Sink that logs every warning at `warn` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWarnings;

impl WarningSink for LogWarnings {
    fn warn(&self, message: &str) {
        log::warn!("{}", message);
    }
}

/// Sink that keeps every message in memory.
#[derive(Debug, Default)]
pub struct CollectedWarnings {
    messages: Mutex<Vec<String>>,
}

impl CollectedWarnings {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the messages received so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    /// Number of messages received so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.lock().map(|m| m.len()).unwrap_or_default()
    }

    /// Whether nothing has been received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WarningSink for CollectedWarnings {
    fn warn(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

/// A sink paired with the quiet setting.
#[derive(Clone)]
pub struct Warnings {
    sink: Arc<dyn WarningSink>,
    quiet: bool,
}

impl std::fmt::Debug for Warnings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Warnings")
            .field("sink", &"<sink>")
            .field("quiet", &self.quiet)
            .finish()
    }
}

impl Default for Warnings {
    fn default() -> Self {
        Self::to_log(false)
    }
}

impl Warnings {
    /// Route warnings to `sink` unless `quiet`.
    #[must_use]
    pub fn new(sink: Arc<dyn WarningSink>, quiet: bool) -> Self {
        Self { sink, quiet }
    }

    /// Route warnings to the log facade unless `quiet`.
    #[must_use]
    pub fn to_log(quiet: bool) -> Self {
        Self::new(Arc::new(LogWarnings), quiet)
    }

    /// Whether warnings are suppressed.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Report a problem with `path`.
    pub fn emit(&self, path: &Path, cause: &dyn Display) {
        if self.quiet {
            log::trace!("Suppressed warning for {}: {}", path.display(), cause);
            return;
        }
        self.sink.warn(&format!("{}: {}", path.display(), cause));
    }
}
