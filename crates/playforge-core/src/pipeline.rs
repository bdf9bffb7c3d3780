//! Request pipeline
//!
//! One request end-to-end, sequentially:
//!
//! 1. Resolve the request into an intent
//! 2. Scan stored artifacts; reuse the best one if it scores at or above the
//!    threshold and still validates
//! 3. Otherwise generate a body (template, backend or stand-in)
//! 4. Persist under a fresh name
//! 5. Validate (typed schema, then the external checker)
//! 6. Commit through the Sync Manager
//!
//! Validation failure halts the request. Everything after a successful
//! write that is not validation (commit, push) is reported, not raised.

use crate::config::AgentConfig;
use crate::error::PipelineError;
use crate::validate::{check_schema, AnsibleSyntaxCheck, PlaybookValidator, SchemaOnly, ValidationReport};
use playforge_artifact::{ArtifactName, ArtifactStore, CandidateArtifact, ReusePolicy};
use playforge_generate::{
    BodySource, GenerateError, GenerationBackend, OllamaBackend, RepairOutcome, StrategySelector,
    TemplateSource,
};
use playforge_intent::{GenerationRoute, IntentResolver, Resolution};
use playforge_sync::{CliGit, CommitOutcome, PushScheduler, SyncError, SyncManager};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Collaborators supplied by the caller
pub struct PipelineParts {
    pub validator: Arc<dyn PlaybookValidator>,
    /// Fallback generation backend; ignored when hybrid mode is off
    pub backend: Option<Arc<dyn GenerationBackend>>,
    pub sync: SyncManager,
}

/// Per-request switches
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Skip the artifact scan and always generate
    pub skip_check: bool,
    /// Extra parameters, added to or overriding the resolved ones
    pub params: Vec<(String, String)>,
}

impl PipelineOptions {
    #[inline]
    #[must_use]
    pub fn skip_check(mut self, skip: bool) -> Self {
        self.skip_check = skip;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

/// Stored artifacts scored against one request
#[derive(Debug)]
pub struct MatchReport {
    pub resolution: Resolution,
    /// Ranked best first
    pub candidates: Vec<CandidateArtifact>,
    pub threshold: f64,
}

impl MatchReport {
    #[must_use]
    pub fn best(&self) -> Option<&CandidateArtifact> {
        self.candidates.first()
    }

    /// Best candidate if it clears the threshold
    #[must_use]
    pub fn reusable(&self) -> Option<&CandidateArtifact> {
        ReusePolicy::new(self.threshold).select(&self.candidates)
    }
}

/// A stored artifact satisfied the request
#[derive(Debug)]
pub struct ReuseReport {
    pub resolution: Resolution,
    pub artifact: CandidateArtifact,
    pub validation: ValidationReport,
}

/// A new artifact was generated, stored and validated
#[derive(Debug)]
pub struct GenerationReport {
    pub resolution: Resolution,
    pub path: PathBuf,
    pub source: BodySource,
    pub repair: RepairOutcome,
    /// Top score of the artifact scan, when one ran and found candidates
    pub best_score: Option<f64>,
    pub validation: ValidationReport,
    pub commit: Result<CommitOutcome, SyncError>,
}

/// Outcome of one request
#[derive(Debug)]
pub enum PipelineReport {
    Reused(ReuseReport),
    Generated(GenerationReport),
}

impl PipelineReport {
    #[must_use]
    pub fn resolution(&self) -> &Resolution {
        match self {
            PipelineReport::Reused(report) => &report.resolution,
            PipelineReport::Generated(report) => &report.resolution,
        }
    }

    /// The artifact to execute
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            PipelineReport::Reused(report) => &report.artifact.path,
            PipelineReport::Generated(report) => &report.path,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_reused(&self) -> bool {
        matches!(self, PipelineReport::Reused(_))
    }
}

/// The request pipeline
pub struct Pipeline {
    resolver: IntentResolver,
    store: ArtifactStore,
    policy: ReusePolicy,
    selector: StrategySelector,
    validator: Arc<dyn PlaybookValidator>,
    sync: SyncManager,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("store", &self.store)
            .field("policy", &self.policy)
            .field("fallback", &self.selector.has_fallback())
            .field("sync", &self.sync)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Assemble a pipeline from explicit parts
    #[must_use]
    pub fn new(config: &AgentConfig, parts: PipelineParts) -> Self {
        let mut selector = StrategySelector::new(TemplateSource::new(config.templates_dir.clone()));
        if config.hybrid_mode.enabled {
            if let Some(backend) = parts.backend {
                selector = selector.with_fallback(backend);
            }
        }

        Self {
            resolver: IntentResolver::new(),
            store: ArtifactStore::new(config.output_dir.clone()),
            policy: ReusePolicy::new(config.matcher.reuse_threshold),
            selector,
            validator: parts.validator,
            sync: parts.sync,
        }
    }

    /// Build the production pipeline
    ///
    /// Returns the push scheduler as well when the push mode is `scheduled`.
    ///
    /// # Errors
    /// - `PipelineError::Store` if the output directory cannot be created
    /// - `PipelineError::Generate` if the HTTP client cannot be built
    pub async fn from_config(
        config: &AgentConfig,
    ) -> Result<(Self, Option<PushScheduler>), PipelineError> {
        ArtifactStore::new(config.output_dir.clone()).ensure().await?;

        let backend: Option<Arc<dyn GenerationBackend>> = if config.hybrid_mode.enabled {
            Some(Arc::new(OllamaBackend::new(config.ollama.clone())?))
        } else {
            None
        };
        let validator: Arc<dyn PlaybookValidator> = if config.validator.enabled {
            Arc::new(AnsibleSyntaxCheck::new(&config.validator))
        } else {
            Arc::new(SchemaOnly)
        };
        let (sync, scheduler) = SyncManager::start(
            config.output_dir.clone(),
            config.git.clone(),
            Arc::new(CliGit::new()),
        )
        .await;

        let parts = PipelineParts {
            validator,
            backend,
            sync,
        };
        Ok((Self::new(config, parts), scheduler))
    }

    #[inline]
    #[must_use]
    pub fn sync(&self) -> &SyncManager {
        &self.sync
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn policy(&self) -> ReusePolicy {
        self.policy
    }

    /// Score stored artifacts against a request without generating anything
    ///
    /// Unrecognized requests have no candidates.
    ///
    /// # Errors
    /// Returns `PipelineError::Store` if the store cannot be listed
    pub async fn find_matches(&self, prompt: &str) -> Result<MatchReport, PipelineError> {
        let resolution = self.resolver.resolve(prompt);
        let candidates = if resolution.is_match() {
            self.store
                .find_candidates(resolution.kind(), &resolution.parameters())
                .await?
        } else {
            Vec::new()
        };

        Ok(MatchReport {
            resolution,
            candidates,
            threshold: self.policy.threshold(),
        })
    }

    /// Run one request through the pipeline
    ///
    /// # Errors
    /// - `PipelineError::NoGenerationRoute` for an unrecognized request without fallback
    /// - `PipelineError::Store` / `PipelineError::Generate` if no body can be produced or stored
    /// - `PipelineError::ValidationFailed` if the stored artifact is rejected
    pub async fn process(
        &self,
        prompt: &str,
        options: PipelineOptions,
    ) -> Result<PipelineReport, PipelineError> {
        let resolution = self.resolver.resolve(prompt);
        let kind = resolution.kind();
        tracing::info!(
            intent = %kind,
            os = %resolution.os_type,
            matched = resolution.is_match(),
            "request resolved"
        );

        if resolution.route == GenerationRoute::FallbackRequired && !self.selector.has_fallback() {
            return Err(PipelineError::NoGenerationRoute);
        }

        let mut params = resolution.parameters();
        for (key, value) in options.params {
            params.enrich(key, value);
        }

        let mut best_score = None;
        if !options.skip_check && resolution.is_match() {
            let candidates = self.store.find_candidates(kind, &params).await?;
            best_score = candidates.first().map(|c| c.score);

            match self.policy.select(&candidates) {
                Some(candidate) => {
                    let validation = self.validate(&candidate.path, &candidate.body).await;
                    if validation.valid {
                        tracing::info!(
                            file = %candidate.file_name,
                            score = candidate.score,
                            "reusing stored artifact"
                        );
                        return Ok(PipelineReport::Reused(ReuseReport {
                            resolution,
                            artifact: candidate.clone(),
                            validation,
                        }));
                    }
                    tracing::warn!(
                        file = %candidate.file_name,
                        reason = %validation.message,
                        "stored artifact no longer validates, generating a new one"
                    );
                }
                None => {
                    if let Some(score) = best_score {
                        tracing::info!(score, threshold = self.policy.threshold(), "no artifact good enough to reuse");
                    }
                }
            }
        }

        let generated = self
            .selector
            .generate(resolution.route, kind, prompt, &params)
            .await
            .map_err(|e| match e {
                GenerateError::FallbackDisabled => PipelineError::NoGenerationRoute,
                other => PipelineError::Generate(other),
            })?;
        if generated.repair == RepairOutcome::LeftAsIs {
            tracing::warn!("generated body is malformed, storing it as-is");
        }

        let name = ArtifactName::now(kind, &resolution.os_type);
        let path = self.store.write_new(name, &generated.body).await?;
        tracing::info!(path = %path.display(), source = ?generated.source, "artifact stored");

        let validation = self.validate(&path, &generated.body).await;
        if !validation.valid {
            tracing::warn!(path = %path.display(), reason = %validation.message, "artifact failed validation");
            return Err(PipelineError::ValidationFailed {
                path,
                report: validation,
            });
        }

        let commit = self.sync.commit(&path, None).await;
        match &commit {
            Ok(CommitOutcome::Committed(record)) => {
                if let Some(Err(e)) = &record.immediate_push {
                    tracing::warn!(error = %e, "push after commit failed, commit kept pending");
                }
            }
            Ok(CommitOutcome::Skipped { reason }) => tracing::debug!(reason, "commit skipped"),
            Err(e) => tracing::warn!(error = %e, "commit failed, artifact kept on disk"),
        }

        Ok(PipelineReport::Generated(GenerationReport {
            resolution,
            path,
            source: generated.source,
            repair: generated.repair,
            best_score,
            validation,
            commit,
        }))
    }

    async fn validate(&self, path: &Path, body: &str) -> ValidationReport {
        if let Err(e) = check_schema(body) {
            return ValidationReport::failed(format!("playbook schema: {e}"), None);
        }
        self.validator.check(path).await
    }
}
