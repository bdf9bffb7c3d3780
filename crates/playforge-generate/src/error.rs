//! Generation errors

use playforge_artifact::PlaybookError;
use playforge_intent::IntentKind;
use std::path::PathBuf;

/// Errors from the generation step
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Intent has no template
    #[error("intent '{0}' has no template")]
    NoTemplate(IntentKind),

    /// Template document missing
    #[error("template not found: {path}")]
    TemplateNotFound { path: PathBuf },

    /// Template could not be read
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Fallback route requested but no backend configured
    #[error("fallback generation is disabled")]
    FallbackDisabled,

    /// Transport failure talking to the backend
    #[error("generation backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("generation backend returned {status}: {body}")]
    BackendStatus { status: u16, body: String },

    /// Backend answered with no text
    #[error("generation backend returned an empty completion")]
    EmptyCompletion,

    /// Stand-in playbook could not be serialized
    #[error(transparent)]
    Playbook(#[from] PlaybookError),
}

impl GenerateError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Backend failures that the stand-in body recovers from
    #[must_use]
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::BackendStatus { .. } | Self::EmptyCompletion
        )
    }
}
