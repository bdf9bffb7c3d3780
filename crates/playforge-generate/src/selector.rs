//! Generation strategy selection
//!
//! `Template` route → fill the intent template.
//! `FallbackRequired` route → backend if it answers its probe, stand-in
//! otherwise (including when the backend fails mid-request).

use crate::backend::{build_prompt, GenerationBackend};
use crate::error::GenerateError;
use crate::postprocess::{normalize, RepairOutcome};
use crate::standin::stand_in_playbook;
use crate::template::TemplateSource;
use playforge_artifact::{Playbook, PlaybookError};
use playforge_intent::{GenerationRoute, IntentKind, ParameterSet};
use serde::Serialize;
use std::sync::Arc;

/// Where a body came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySource {
    Template,
    Backend,
    StandIn,
}

/// A generated body ready to persist
#[derive(Debug)]
pub struct GeneratedArtifact {
    pub body: String,
    pub source: BodySource,
    pub repair: RepairOutcome,
    /// Typed playbook, or why the body does not fit the schema
    pub schema: Result<Playbook, PlaybookError>,
}

impl GeneratedArtifact {
    /// Typed playbook if the body fits the schema
    #[must_use]
    pub fn playbook(&self) -> Option<&Playbook> {
        self.schema.as_ref().ok()
    }
}

/// Chooses and runs a generation strategy
pub struct StrategySelector {
    templates: TemplateSource,
    fallback: Option<Arc<dyn GenerationBackend>>,
}

impl StrategySelector {
    /// Create selector with template filling only
    #[must_use]
    pub fn new(templates: TemplateSource) -> Self {
        Self {
            templates,
            fallback: None,
        }
    }

    /// Enable the fallback route through `backend`
    #[must_use]
    pub fn with_fallback(mut self, backend: Arc<dyn GenerationBackend>) -> Self {
        self.fallback = Some(backend);
        self
    }

    #[inline]
    #[must_use]
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    #[inline]
    #[must_use]
    pub fn templates(&self) -> &TemplateSource {
        &self.templates
    }

    /// Produce a body for one request
    ///
    /// # Errors
    /// - Template errors on the template route
    /// - `GenerateError::FallbackDisabled` on the fallback route without a backend
    pub async fn generate(
        &self,
        route: GenerationRoute,
        kind: IntentKind,
        request: &str,
        params: &ParameterSet,
    ) -> Result<GeneratedArtifact, GenerateError> {
        match route {
            GenerationRoute::Template => {
                let raw = self.templates.render(kind, params).await?;
                tracing::info!(intent = %kind, "generated from template");
                Ok(finish(&raw, BodySource::Template))
            }
            GenerationRoute::FallbackRequired => {
                let backend = self
                    .fallback
                    .as_ref()
                    .ok_or(GenerateError::FallbackDisabled)?;
                self.run_fallback(backend.as_ref(), request, params).await
            }
        }
    }

    async fn run_fallback(
        &self,
        backend: &dyn GenerationBackend,
        request: &str,
        params: &ParameterSet,
    ) -> Result<GeneratedArtifact, GenerateError> {
        if backend.probe().await {
            match backend.complete(&build_prompt(request)).await {
                Ok(raw) => {
                    tracing::info!("generated by backend");
                    return Ok(finish(&raw, BodySource::Backend));
                }
                Err(e) if e.is_backend_unavailable() => {
                    tracing::warn!(error = %e, "generation backend failed, using stand-in");
                }
                Err(e) => return Err(e),
            }
        } else {
            tracing::warn!("generation backend unavailable, using stand-in");
        }

        let playbook = stand_in_playbook(request, params);
        let body = playbook.to_yaml()?;
        Ok(GeneratedArtifact {
            body,
            source: BodySource::StandIn,
            repair: RepairOutcome::WellFormed,
            schema: Ok(playbook),
        })
    }
}

fn finish(raw: &str, source: BodySource) -> GeneratedArtifact {
    let normalized = normalize(raw);
    GeneratedArtifact {
        body: normalized.body,
        source,
        repair: normalized.outcome,
        schema: normalized.schema,
    }
}
