//! Error taxonomy for module resolution, parameter collection and templating

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the core
pub type ModuleResult<T> = Result<T, ModuleError>;

/// Errors raised while instantiating a module
///
/// Some variants describe a broken setup rather than a runtime condition.
/// The core never terminates the process itself; callers check
/// [`ModuleError::is_fatal`] and decide whether to stop.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The module source could not be classified
    #[error("Invalid module source '{uri}': {reason}")]
    Configuration { uri: String, reason: String },

    /// The module descriptor is missing or unparsable
    #[error("Failed to load module descriptor {}: {message}", path.display())]
    Descriptor { path: PathBuf, message: String },

    /// Transport failure while fetching a remote module
    #[error("Failed to fetch module '{uri}': {message}")]
    Fetch { uri: String, message: String },

    /// The user cancelled an interactive prompt
    #[error("Prompt for '{field}' was cancelled")]
    UserAbort { field: String },

    /// An Execute-mode prompt command failed to spawn or exited non-zero
    #[error("Failed to execute '{command}': {message}")]
    CommandExecution { command: String, message: String },

    /// Template execution failed for one output file
    #[error("Error templating '{}': {message}", path.display())]
    Render { path: PathBuf, message: String },

    /// Filesystem failure while writing one output file
    #[error("Error writing '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ModuleError {
    /// Whether the error signals a misconfigured module or setup
    ///
    /// Fatal errors should end the whole run. The rest are either recoverable
    /// (`Fetch`, `UserAbort`) or reported per file (`Render`, `Write`).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ModuleError::Configuration { .. }
                | ModuleError::Descriptor { .. }
                | ModuleError::CommandExecution { .. }
        )
    }

    pub(crate) fn fetch(uri: &str, message: impl std::fmt::Display) -> Self {
        ModuleError::Fetch {
            uri: uri.to_string(),
            message: message.to_string(),
        }
    }
}
