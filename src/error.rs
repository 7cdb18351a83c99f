//! Error types for the `bottlerack` engine
//!
//! One enum covers the whole crate, split along the failure classes the
//! synchronizer cares about: configuration errors (fatal to the requested
//! action), I/O errors (wrapped with the offending path where one exists),
//! and subprocess errors from the Wine registry tool. Resolution failures
//! inside a synchronization batch are deliberately *not* errors — they are
//! reported as log lines and the batch continues.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for `bottlerack` operations
#[derive(Debug, Error)]
pub enum Error {
    /// No usable Wine/CrossOver runtime was found on this machine
    #[error("Wine runtime not found (install CrossOver or Wine first)")]
    RuntimeNotFound,

    /// A data wipe was requested without selecting anything to wipe
    #[error("Data wipe requires selecting account data, library data, or both")]
    WipeSelectionRequired,

    /// A store config file exists but could not be read
    #[error("Config file unreadable: {}", path.display())]
    ConfigUnreadable {
        /// Offending file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A store config file could not be written back
    #[error("Config file write failed: {}", path.display())]
    ConfigWriteFailed {
        /// Offending file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Key/value document syntax error
    #[error("Key/value syntax error: {0}")]
    Syntax(#[from] crate::keyvalue::SyntaxError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A subprocess could not be spawned at all
    #[error("Failed to launch command ({command}): {source}")]
    CommandLaunchFailed {
        /// The command line that failed to start
        command: String,
        /// Underlying spawn failure
        #[source]
        source: std::io::Error,
    },

    /// A subprocess exited with a non-zero status
    #[error("Command failed ({command}) with exit code {status}:\n{output}")]
    CommandFailed {
        /// The command line that failed
        command: String,
        /// Exit code (or -1 when terminated by signal)
        status: i32,
        /// Captured stdout+stderr
        output: String,
    },

    /// A subprocess exceeded its allotted time and was killed
    #[error("Command timed out after {timeout_secs}s ({command})")]
    CommandTimedOut {
        /// The command line that hung
        command: String,
        /// The enforced timeout
        timeout_secs: u64,
    },
}

impl Error {
    /// Whether this error is a registry-tool "object not found" failure.
    ///
    /// `reg query`/`reg delete` report a missing key or value as a non-zero
    /// exit with a localized message; callers treat that as an empty result
    /// rather than a hard failure. Matches the phrases the tool is known to
    /// emit (English and Spanish builds).
    pub fn is_missing_registry_object(&self) -> bool {
        match self {
            Self::CommandFailed { output, .. } => {
                let normalized = output.to_lowercase();
                normalized.contains("unable to find")
                    || normalized.contains("cannot find")
                    || normalized.contains("could not find")
                    || normalized.contains("no se pudo encontrar")
            }
            _ => false,
        }
    }
}

/// Result type alias for `bottlerack` operations
pub type Result<T> = std::result::Result<T, Error>;
