//! Pipeline errors
//!
//! Only failures that halt a request live here. Degraded outcomes (low
//! match score, stand-in body, commit or push failure) are carried in the
//! report instead.

use crate::config::ConfigError;
use crate::validate::ValidationReport;
use playforge_artifact::StoreError;
use playforge_generate::GenerateError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Unrecognized request and fallback generation switched off
    #[error("no intent pattern matched and fallback generation is disabled")]
    NoGenerationRoute,

    #[error("artifact store error: {0}")]
    Store(#[from] StoreError),

    #[error("generation failed: {0}")]
    Generate(#[from] GenerateError),

    /// Stored artifact rejected; the file stays on disk uncommitted
    #[error("validation failed for {}: {}", path.display(), report.message)]
    ValidationFailed {
        path: PathBuf,
        report: ValidationReport,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PipelineError {
    /// Whether repeating the same request may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Generate(e) => e.is_backend_unavailable(),
            Self::Store(StoreError::NameExhausted(_)) => true,
            _ => false,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, Self::ValidationFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let err = PipelineError::ValidationFailed {
            path: PathBuf::from("output/a.yml"),
            report: ValidationReport::failed("syntax check failed", None),
        };
        assert!(err.is_validation_failure());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "validation failed for output/a.yml: syntax check failed");

        assert!(PipelineError::Generate(GenerateError::EmptyCompletion).is_retryable());
        assert!(!PipelineError::NoGenerationRoute.is_retryable());
    }
}
