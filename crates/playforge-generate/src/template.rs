//! Template source
//!
//! One document per template-backed intent, `<dir>/<intent>.yml`, with
//! `{{parameter_name}}` placeholders. Substitution is verbatim: no escaping,
//! no type coercion, and placeholders without a value are left in place.

use crate::error::GenerateError;
use playforge_intent::{IntentKind, ParameterSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Directory of intent templates
#[derive(Debug, Clone)]
pub struct TemplateSource {
    dir: PathBuf,
}

impl TemplateSource {
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the template for `kind`, if the intent has one
    #[must_use]
    pub fn path_for(&self, kind: IntentKind) -> Option<PathBuf> {
        kind.template_file().map(|file| self.dir.join(file))
    }

    /// Fill the template for `kind` with `params`
    ///
    /// # Errors
    /// - `GenerateError::NoTemplate` for [`IntentKind::Unknown`]
    /// - `GenerateError::TemplateNotFound` if the document is missing
    /// - `GenerateError::Io` on read failure
    pub async fn render(
        &self,
        kind: IntentKind,
        params: &ParameterSet,
    ) -> Result<String, GenerateError> {
        let path = self.path_for(kind).ok_or(GenerateError::NoTemplate(kind))?;

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(GenerateError::TemplateNotFound { path });
            }
            Err(e) => return Err(GenerateError::io_error(path, e)),
        };

        tracing::debug!(template = %path.display(), params = params.len(), "rendering template");
        Ok(substitute(&content, params))
    }
}

/// Replace every `{{key}}` with its value
#[must_use]
pub fn substitute(content: &str, params: &ParameterSet) -> String {
    params
        .iter()
        .fold(content.to_string(), |text, (key, value)| {
            text.replace(&format!("{{{{{key}}}}}"), value)
        })
}
