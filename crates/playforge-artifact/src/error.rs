//! Error types for the artifact system
//!
//! - Playbook parsing (syntax vs. schema conformance)
//! - Artifact store I/O

use std::path::PathBuf;

/// A task mapping that does not fit the task schema
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskSchemaError {
    /// Task has no `name`
    #[error("task has no name")]
    MissingName,

    /// `name` is not a string
    #[error("task name must be a string")]
    InvalidName,

    /// A key is not a string
    #[error("task '{task}' has a non-string key")]
    NonStringKey { task: String },

    /// No action module key
    #[error("task '{task}' has no action module")]
    NoAction { task: String },

    /// More than one action module key
    #[error("task '{task}' has more than one action module: {modules:?}")]
    MultipleActions { task: String, modules: Vec<String> },
}

/// Errors turning text into a [`crate::Playbook`]
#[derive(Debug, thiserror::Error)]
pub enum PlaybookError {
    /// Text is not well-formed YAML
    #[error("malformed YAML: {0}")]
    Syntax(#[source] serde_yaml::Error),

    /// Well-formed YAML that does not fit the playbook schema
    #[error("playbook schema violation: {0}")]
    Schema(String),

    /// Serialization failed
    #[error("playbook serialization failed: {0}")]
    Serialize(#[source] serde_yaml::Error),
}

impl PlaybookError {
    /// Whether the text failed before schema checks
    #[inline]
    #[must_use]
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax(_))
    }

    /// Create schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }
}

/// Errors from the artifact store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O failure on a path
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not find a free artifact name
    #[error("no free artifact name for {0}")]
    NameExhausted(String),
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
