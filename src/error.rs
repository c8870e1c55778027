//! Error taxonomy for one `xdg-open` invocation
//!
//! Every variant is terminal: the invocation aborts, nothing is launched
//! after a failure, and the binary maps the variant to an exit code.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type for open operations
pub type Result<T> = std::result::Result<T, OpenError>;

/// Open-related errors
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("Failed to resolve {path:?}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Resolved path {path:?} is not valid Unicode")]
    NonUnicodePath { path: PathBuf },

    #[error("Failed to run path translation utility {program:?}: {source}")]
    TranslatorSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path translation utility {program:?} failed ({status}): {stderr}")]
    TranslatorFailed {
        program: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Path translation utility {program:?} returned unusable output for {path:?}")]
    TranslatorOutput { program: PathBuf, path: PathBuf },

    #[error("Failed to launch {program:?}: {source}")]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl OpenError {
    /// Whether the error came from turning the argument into a Windows path
    #[must_use]
    pub fn is_translation(&self) -> bool {
        matches!(
            self,
            OpenError::Resolve { .. }
                | OpenError::NonUnicodePath { .. }
                | OpenError::TranslatorSpawn { .. }
                | OpenError::TranslatorFailed { .. }
                | OpenError::TranslatorOutput { .. }
        )
    }

    /// Process exit code reported for this error
    ///
    /// Translation failures exit with 2, launch failures with 3, anything
    /// else with 1.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        if self.is_translation() {
            2
        } else if matches!(self, OpenError::Launch { .. }) {
            3
        } else {
            1
        }
    }
}
