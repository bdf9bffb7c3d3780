//! Testing utilities for the Playforge workspace
//!
//! Shared fakes and fixtures: a scripted git runner, fixed-verdict
//! validator and backend, and a temporary workspace wired to the shipped
//! templates.

#![allow(missing_docs)]

pub mod fakes;
pub mod git;

pub use fakes::{FakeBackend, FakeValidator};
pub use git::{FakeGit, GitCall};

use playforge_core::{AgentConfig, Pipeline, PipelineParts};
use playforge_generate::GenerationBackend;
use playforge_sync::{PushScheduler, SyncConfig, SyncManager};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Templates directory at the workspace root
#[must_use]
pub fn shipped_templates_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../templates")
}

/// Temporary output directory plus a configuration pointing at it
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    pub config: AgentConfig,
}

impl Workspace {
    /// # Panics
    /// If the temporary directory cannot be created
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let config = AgentConfig {
            output_dir: dir.path().join("output"),
            templates_dir: shipped_templates_dir(),
            ..AgentConfig::default()
        };
        Self { dir, config }
    }

    /// Replace the `git` section
    #[must_use]
    pub fn with_git(mut self, git: SyncConfig) -> Self {
        self.config.git = git;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    #[must_use]
    pub fn output(&self) -> &Path {
        &self.config.output_dir
    }

    /// Write a stored artifact directly
    ///
    /// # Panics
    /// If the file cannot be written
    pub fn write_artifact(&self, file_name: &str, body: &str) -> PathBuf {
        std::fs::create_dir_all(self.output()).expect("create output dir");
        let path = self.output().join(file_name);
        std::fs::write(&path, body).expect("write artifact");
        path
    }

    /// Start a sync manager on the output directory
    pub async fn sync(&self, git: &FakeGit) -> (SyncManager, Option<PushScheduler>) {
        SyncManager::start(
            self.config.output_dir.clone(),
            self.config.git.clone(),
            Arc::new(git.clone()),
        )
        .await
    }

    /// Start a pipeline wired to fakes
    pub async fn pipeline(
        &self,
        git: &FakeGit,
        validator: FakeValidator,
        backend: Option<FakeBackend>,
    ) -> (Pipeline, Option<PushScheduler>) {
        let (sync, scheduler) = self.sync(git).await;
        let parts = PipelineParts {
            validator: Arc::new(validator),
            backend: backend.map(|b| Arc::new(b) as Arc<dyn GenerationBackend>),
            sync,
        };
        (Pipeline::new(&self.config, parts), scheduler)
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

/// `git` section with a remote in the given push mode
#[must_use]
pub fn remote_config(mode: playforge_sync::PushMode) -> SyncConfig {
    SyncConfig {
        remote_enabled: true,
        remote_push_mode: mode,
        remote_url: "https://git.example.com/ops/playbooks.git".to_string(),
        ..SyncConfig::default()
    }
}
