//! Sync errors
//!
//! Every variant is non-fatal: callers report it and carry on.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Version control is switched off
    #[error("version control is disabled")]
    Disabled,

    /// The repository has not been initialized
    #[error("repository is not initialized")]
    NotInitialized,

    /// Remote push is not enabled or has no URL
    #[error("remote push not configured")]
    NotConfigured,

    /// A credential field was empty
    #[error("no {0} provided")]
    MissingCredential(&'static str),

    /// `git` could not be started
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// `git` did not finish in time
    #[error("`{command}` timed out after {}s", after.as_secs())]
    Timeout { command: String, after: Duration },

    /// `git` exited non-zero
    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Unexpected `git` output
    #[error("unexpected output from `{command}`: {output}")]
    UnexpectedOutput { command: String, output: String },

    /// File system failure
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Failures worth trying again later without changing anything
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::CommandFailed { .. })
    }

    /// Diagnostic text from git, if any
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { stderr, .. } => Some(stderr.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display_and_classification() {
        let err = SyncError::Timeout {
            command: "git push origin main".to_string(),
            after: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "`git push origin main` timed out after 30s");
        assert!(err.is_timeout());
        assert!(err.is_retryable());
        assert!(!SyncError::NotConfigured.is_retryable());
    }

    #[test]
    fn diagnostic_only_for_failed_commands() {
        let err = SyncError::CommandFailed {
            command: "git commit".to_string(),
            stderr: "nothing to commit".to_string(),
        };
        assert_eq!(err.diagnostic(), Some("nothing to commit"));
        assert_eq!(SyncError::Disabled.diagnostic(), None);
    }
}
