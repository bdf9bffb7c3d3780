//! Fake validator and generation backend

use parking_lot::Mutex;
use playforge_core::{PlaybookValidator, ValidationReport};
use playforge_generate::{GenerateError, GenerationBackend};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Validator with a fixed verdict that records what it checked
#[derive(Debug, Clone)]
pub struct FakeValidator {
    verdict: ValidationReport,
    checked: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeValidator {
    #[must_use]
    pub fn passing() -> Self {
        Self::with_verdict(ValidationReport::passed("syntax check passed"))
    }

    #[must_use]
    pub fn failing(diagnostic: &str) -> Self {
        Self::with_verdict(ValidationReport::failed(
            "syntax check failed",
            Some(diagnostic.to_string()),
        ))
    }

    fn with_verdict(verdict: ValidationReport) -> Self {
        Self {
            verdict,
            checked: Arc::default(),
        }
    }

    #[must_use]
    pub fn checked(&self) -> Vec<PathBuf> {
        self.checked.lock().clone()
    }
}

#[async_trait::async_trait]
impl PlaybookValidator for FakeValidator {
    async fn check(&self, path: &Path) -> ValidationReport {
        self.checked.lock().push(path.to_path_buf());
        self.verdict.clone()
    }
}

#[derive(Debug, Clone)]
enum Completion {
    Text(String),
    Status(u16),
}

/// Generation backend with a fixed reachability and answer
#[derive(Debug, Clone)]
pub struct FakeBackend {
    reachable: bool,
    completion: Completion,
    probes: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeBackend {
    /// Reachable backend answering `text`
    #[must_use]
    pub fn answering(text: &str) -> Self {
        Self::build(true, Completion::Text(text.to_string()))
    }

    /// Backend that fails its probe
    #[must_use]
    pub fn offline() -> Self {
        Self::build(false, Completion::Status(503))
    }

    /// Reachable backend whose completions fail with `status`
    #[must_use]
    pub fn failing_with(status: u16) -> Self {
        Self::build(true, Completion::Status(status))
    }

    fn build(reachable: bool, completion: Completion) -> Self {
        Self {
            reachable,
            completion,
            probes: Arc::default(),
            prompts: Arc::default(),
        }
    }

    #[must_use]
    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait::async_trait]
impl GenerationBackend for FakeBackend {
    async fn probe(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.reachable
    }

    async fn complete(&self, prompt: &str) -> Result<String, GenerateError> {
        self.prompts.lock().push(prompt.to_string());
        match &self.completion {
            Completion::Text(text) => Ok(text.clone()),
            Completion::Status(status) => Err(GenerateError::BackendStatus {
                status: *status,
                body: "unavailable".to_string(),
            }),
        }
    }
}
