//! Playbook validation
//!
//! Two layers: the typed schema check ([`check_schema`]) and an external
//! syntax checker behind [`PlaybookValidator`].

use crate::config::ValidatorSettings;
use playforge_artifact::{Playbook, PlaybookError};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of validating one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub message: String,
    /// Raw output from the checker, if any
    pub diagnostic: Option<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn passed(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: message.into(),
            diagnostic: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>, diagnostic: Option<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
            diagnostic,
        }
    }
}

/// External well-formedness check on a stored file
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlaybookValidator: Send + Sync {
    /// Check the file at `path`
    ///
    /// Never fails: an unavailable checker is an invalid report.
    async fn check(&self, path: &Path) -> ValidationReport;
}

/// Typed schema check over a body
///
/// # Errors
/// Returns the parse or schema error
pub fn check_schema(body: &str) -> Result<Playbook, PlaybookError> {
    Playbook::from_yaml(body)
}

/// `ansible-playbook --syntax-check`
#[derive(Debug, Clone)]
pub struct AnsibleSyntaxCheck {
    program: PathBuf,
    timeout: Duration,
}

impl AnsibleSyntaxCheck {
    #[must_use]
    pub fn new(settings: &ValidatorSettings) -> Self {
        Self {
            program: settings.program.clone(),
            timeout: settings.timeout(),
        }
    }

    #[inline]
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait::async_trait]
impl PlaybookValidator for AnsibleSyntaxCheck {
    async fn check(&self, path: &Path) -> ValidationReport {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return ValidationReport::failed(format!("file not found: {}", path.display()), None);
        }

        let child = tokio::process::Command::new(&self.program)
            .arg("--syntax-check")
            .arg(path)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Err(_) => {
                tracing::warn!(path = %path.display(), "syntax check timed out");
                return ValidationReport::failed(
                    format!("syntax check timed out after {}s", self.timeout.as_secs()),
                    None,
                );
            }
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(program = %self.program.display(), "syntax checker not installed");
                return ValidationReport::failed(
                    format!("{} not found", self.program.display()),
                    None,
                );
            }
            Ok(Err(e)) => {
                return ValidationReport::failed(
                    format!("cannot run {}: {e}", self.program.display()),
                    None,
                );
            }
            Ok(Ok(output)) => output,
        };

        if output.status.success() {
            ValidationReport::passed("syntax check passed")
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let diagnostic = if stderr.is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr
            };
            ValidationReport::failed("syntax check failed", Some(diagnostic))
        }
    }
}

/// Validator used when the external check is switched off
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaOnly;

#[async_trait::async_trait]
impl PlaybookValidator for SchemaOnly {
    async fn check(&self, path: &Path) -> ValidationReport {
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            ValidationReport::passed("external syntax check disabled")
        } else {
            ValidationReport::failed(format!("file not found: {}", path.display()), None)
        }
    }
}
