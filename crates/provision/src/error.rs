//! Error types for provisioning runs.
//!
//! Every variant is terminal to the run. The only non-fatal condition, an
//! unrecognized module name, is reported through the runner's observer and
//! never becomes an `Error`.

use std::path::PathBuf;

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while provisioning a host.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad or missing flags, or no module selected.
    #[error("usage error: {0}")]
    Usage(String),

    /// The process is not running with administrative rights.
    #[error("must be run as root (effective uid is {euid})")]
    Privilege {
        /// Effective uid of the current process.
        euid: u32,
    },

    /// The identity source could not be read or carried no `ID`.
    #[error("cannot detect distribution from {}: {reason}", path.display())]
    Detection {
        /// Identity file that was consulted.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// A module needs a concrete package family but none was resolved.
    #[error("unsupported package manager for distribution '{distro}' (required by {module})")]
    UnsupportedFamily {
        /// Module that required the family.
        module: String,
        /// Distribution id that resolved to an unknown family.
        distro: String,
    },

    /// An action passed through the gateway and failed.
    #[error("action '{label}' failed: {output}")]
    ActionFailed {
        /// Human-readable label of the action.
        label: String,
        /// Captured output of the failed effect.
        output: String,
    },

    /// An interruption signal was delivered to the process.
    #[error("interrupted by signal {signal}")]
    Interrupted {
        /// Signal number that was received.
        signal: i32,
    },

    /// A module failed; wraps the underlying error with the module name.
    #[error("module '{module}' failed")]
    ModuleFailed {
        /// Name of the module that was running.
        module: String,
        /// Underlying failure.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap an error with the name of the module that produced it.
    pub fn in_module(self, module: &str) -> Self {
        Self::ModuleFailed {
            module: module.to_string(),
            source: Box::new(self),
        }
    }

    /// Strip `ModuleFailed` wrappers and return the underlying failure.
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::ModuleFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Name of the module that was running when the error occurred, if any.
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::ModuleFailed { module, .. } => Some(module),
            _ => None,
        }
    }
}
