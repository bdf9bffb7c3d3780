//! Sync Manager
//!
//! One instance owns one repository path. Configuration is fixed at
//! construction; the pending queue and last-push time live behind a single
//! async mutex shared with the [`PushScheduler`].
//!
//! The mutex is held across a push attempt and the queue clear, so a push
//! either clears exactly the commits it sent or leaves the queue untouched.

use crate::config::{PushMode, SyncConfig};
use crate::credentials::Credentials;
use crate::error::SyncError;
use crate::git::{render_command, GitOutput, GitRunner};
use crate::scheduler::PushScheduler;
use chrono::{DateTime, Local, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Timeout for local git subcommands
const GIT_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for manual and scheduled pushes
pub const PUSH_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for pushes with explicit credentials
pub const CREDENTIALED_PUSH_TIMEOUT: Duration = Duration::from_secs(60);

const REMOTE_NAME: &str = "origin";
const AUTHOR_NAME: &str = "Playforge Agent";
const AUTHOR_EMAIL: &str = "playforge-agent@localhost";
const COMMIT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const GITIGNORE: &str = "# Ignore temporary files\n*.tmp\n*.swp\n.DS_Store\n";

/// Repository lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Version control switched off
    Disabled,
    Uninitialized,
    /// Repository ready for local commits
    LocalReady,
    /// Local commits can also be pushed
    RemoteConfigured,
}

/// Result of a successful push call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushReport {
    /// Queue was empty, nothing was sent
    NothingPending,
    /// Branch pushed, `count` queued commits cleared
    Pushed { count: usize, at: DateTime<Utc> },
}

impl fmt::Display for PushReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushReport::NothingPending => f.write_str("no pending commits to push"),
            PushReport::Pushed { count, .. } => write!(f, "pushed {count} commit(s) to remote"),
        }
    }
}

/// A local commit
#[derive(Debug)]
pub struct CommitRecord {
    /// Short commit identifier
    pub hash: String,
    pub message: String,
    /// Whether the commit will reach the remote through a push
    pub pending_push: bool,
    /// Push attempted right after the commit (`immediate` mode only)
    pub immediate_push: Option<Result<PushReport, SyncError>>,
}

/// Result of a commit call that did not fail
#[derive(Debug)]
pub enum CommitOutcome {
    Skipped { reason: &'static str },
    Committed(CommitRecord),
}

impl CommitOutcome {
    #[must_use]
    pub fn record(&self) -> Option<&CommitRecord> {
        match self {
            CommitOutcome::Committed(record) => Some(record),
            CommitOutcome::Skipped { .. } => None,
        }
    }
}

/// Snapshot for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub state: SyncState,
    pub repo_path: PathBuf,
    pub branch: String,
    pub commit_count: u64,
    pub remote_url: Option<String>,
    pub push_mode: Option<PushMode>,
    pub pending: usize,
    pub last_push: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct PushQueue {
    pending: Vec<String>,
    last_push: Option<DateTime<Utc>>,
}

struct Inner {
    repo: PathBuf,
    config: SyncConfig,
    git: Arc<dyn GitRunner>,
    state: RwLock<SyncState>,
    queue: Mutex<PushQueue>,
}

/// Owner of one artifact repository
#[derive(Clone)]
pub struct SyncManager {
    inner: Arc<Inner>,
}

impl fmt::Debug for SyncManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncManager")
            .field("repo", &self.inner.repo)
            .field("state", &self.state())
            .field("push_mode", &self.inner.config.remote_push_mode)
            .finish_non_exhaustive()
    }
}

impl SyncManager {
    /// Create manager without touching the file system
    #[must_use]
    pub fn new(repo: impl Into<PathBuf>, config: SyncConfig, git: Arc<dyn GitRunner>) -> Self {
        let state = if config.enabled {
            SyncState::Uninitialized
        } else {
            SyncState::Disabled
        };
        Self {
            inner: Arc::new(Inner {
                repo: repo.into(),
                config,
                git,
                state: RwLock::new(state),
                queue: Mutex::new(PushQueue::default()),
            }),
        }
    }

    /// Create, initialize, and start the scheduler when the push mode asks for it
    ///
    /// An initialization failure is logged and leaves version control disabled.
    pub async fn start(
        repo: impl Into<PathBuf>,
        config: SyncConfig,
        git: Arc<dyn GitRunner>,
    ) -> (Self, Option<PushScheduler>) {
        let manager = Self::new(repo, config, git);

        if manager.state() != SyncState::Disabled {
            if let Err(e) = manager.initialize().await {
                tracing::warn!(error = %e, repo = %manager.repo().display(), "could not initialize repository, version control disabled");
                *manager.inner.state.write() = SyncState::Disabled;
            }
        }

        let scheduler = (manager.state() == SyncState::RemoteConfigured
            && manager.inner.config.remote_push_mode == PushMode::Scheduled)
            .then(|| PushScheduler::spawn(manager.clone(), manager.inner.config.push_period()));

        (manager, scheduler)
    }

    #[inline]
    #[must_use]
    pub fn repo(&self) -> &Path {
        &self.inner.repo
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn state(&self) -> SyncState {
        *self.inner.state.read()
    }

    /// Commits not yet pushed, oldest first
    pub async fn pending(&self) -> Vec<String> {
        self.inner.queue.lock().await.pending.clone()
    }

    pub async fn has_pending(&self) -> bool {
        !self.inner.queue.lock().await.pending.is_empty()
    }

    pub async fn last_push(&self) -> Option<DateTime<Utc>> {
        self.inner.queue.lock().await.last_push
    }

    async fn git(&self, args: &[&str]) -> Result<GitOutput, SyncError> {
        self.inner.git.run(&self.inner.repo, args, GIT_TIMEOUT).await
    }

    async fn git_checked(&self, args: &[&str]) -> Result<GitOutput, SyncError> {
        let output = self.git(args).await?;
        if output.success {
            Ok(output)
        } else {
            Err(SyncError::CommandFailed {
                command: render_command(args),
                stderr: output.diagnostic().to_string(),
            })
        }
    }

    /// Ensure repository, author identity, ignore list and remote exist
    ///
    /// Safe to call repeatedly. A remote that cannot be set up leaves the
    /// manager in [`SyncState::LocalReady`].
    ///
    /// # Errors
    /// - `SyncError::Disabled` if version control is off
    /// - Git or I/O failures while preparing the local repository
    pub async fn initialize(&self) -> Result<SyncState, SyncError> {
        if self.state() == SyncState::Disabled {
            return Err(SyncError::Disabled);
        }

        let repo = &self.inner.repo;
        tokio::fs::create_dir_all(repo)
            .await
            .map_err(|e| SyncError::io_error(repo, e))?;

        let has_git_dir = tokio::fs::metadata(repo.join(".git"))
            .await
            .is_ok_and(|meta| meta.is_dir());
        if !has_git_dir {
            let initial_branch = format!("--initial-branch={}", self.inner.config.branch);
            self.git_checked(&["init", initial_branch.as_str()]).await?;
            tracing::info!(repo = %repo.display(), "initialized repository");
        }

        self.ensure_identity().await?;
        self.ensure_gitignore().await?;

        let mut next = SyncState::LocalReady;
        if self.inner.config.remote_configured() {
            match self.ensure_remote().await {
                Ok(()) => next = SyncState::RemoteConfigured,
                Err(e) => {
                    tracing::warn!(error = %e, "could not set up remote, committing locally only");
                }
            }
        }

        *self.inner.state.write() = next;
        Ok(next)
    }

    async fn ensure_identity(&self) -> Result<(), SyncError> {
        if self.git(&["config", "user.name"]).await?.success {
            return Ok(());
        }
        self.git_checked(&["config", "user.name", AUTHOR_NAME]).await?;
        self.git_checked(&["config", "user.email", AUTHOR_EMAIL]).await?;
        tracing::info!("configured commit author");
        Ok(())
    }

    async fn ensure_gitignore(&self) -> Result<(), SyncError> {
        let path = self.inner.repo.join(".gitignore");
        if tokio::fs::try_exists(&path)
            .await
            .map_err(|e| SyncError::io_error(&path, e))?
        {
            return Ok(());
        }
        tokio::fs::write(&path, GITIGNORE)
            .await
            .map_err(|e| SyncError::io_error(&path, e))
    }

    async fn ensure_remote(&self) -> Result<(), SyncError> {
        let url = self.inner.config.remote_url.trim();
        let current = self.git(&["remote", "get-url", REMOTE_NAME]).await?;

        if !current.success {
            self.git_checked(&["remote", "add", REMOTE_NAME, url]).await?;
            tracing::info!(url, "added remote");
        } else if current.text() != url {
            self.git_checked(&["remote", "set-url", REMOTE_NAME, url]).await?;
            tracing::info!(url, "updated remote");
        }
        Ok(())
    }

    fn default_message(&self, path: &Path) -> String {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let timestamp = Local::now().format(COMMIT_TIMESTAMP_FORMAT).to_string();
        self.inner.config.commit_message(&filename, &timestamp)
    }

    /// Stage and commit one artifact
    ///
    /// The new commit is queued as pending. In `immediate` mode with a
    /// configured remote, one push is attempted afterwards; its result is
    /// carried in the record rather than failing the commit.
    ///
    /// # Errors
    /// - `SyncError::NotInitialized` before [`SyncManager::initialize`]
    /// - Git failures while staging or committing
    pub async fn commit(
        &self,
        path: &Path,
        message: Option<&str>,
    ) -> Result<CommitOutcome, SyncError> {
        match self.state() {
            SyncState::Disabled => {
                return Ok(CommitOutcome::Skipped {
                    reason: "version control is disabled",
                })
            }
            SyncState::Uninitialized => return Err(SyncError::NotInitialized),
            SyncState::LocalReady | SyncState::RemoteConfigured => {}
        }
        if !self.inner.config.auto_commit {
            return Ok(CommitOutcome::Skipped {
                reason: "auto-commit is disabled",
            });
        }

        let relative = path.strip_prefix(&self.inner.repo).unwrap_or(path);
        let relative = relative.to_string_lossy();

        // Held until the hash is queued so a concurrent push cannot send the
        // commit without clearing it.
        let mut queue = self.inner.queue.lock().await;
        self.git_checked(&["add", "--", relative.as_ref()]).await?;

        let message = message.map_or_else(|| self.default_message(path), str::to_string);
        self.git_checked(&["commit", "-m", message.as_str()]).await?;

        let head = self.git_checked(&["rev-parse", "--short", "HEAD"]).await?;
        let hash = head.text().to_string();
        if hash.is_empty() {
            return Err(SyncError::UnexpectedOutput {
                command: render_command(&["rev-parse", "--short", "HEAD"]),
                output: head.stdout,
            });
        }

        queue.pending.push(hash.clone());
        drop(queue);
        tracing::info!(commit = %hash, file = %relative, "committed artifact");

        let remote = self.state() == SyncState::RemoteConfigured;
        let immediate_push = if remote && self.inner.config.remote_push_mode == PushMode::Immediate {
            Some(self.push().await)
        } else {
            None
        };

        Ok(CommitOutcome::Committed(CommitRecord {
            hash,
            message,
            pending_push: remote,
            immediate_push,
        }))
    }

    /// Push the branch to the configured remote
    ///
    /// Succeeds without network activity when nothing is pending.
    ///
    /// # Errors
    /// - `SyncError::NotConfigured` without a configured remote
    /// - `SyncError::Timeout` / `SyncError::CommandFailed`; the queue is unchanged
    pub async fn push(&self) -> Result<PushReport, SyncError> {
        if self.state() != SyncState::RemoteConfigured {
            return Err(SyncError::NotConfigured);
        }

        let mut queue = self.inner.queue.lock().await;
        if queue.pending.is_empty() {
            return Ok(PushReport::NothingPending);
        }

        let args = ["push", REMOTE_NAME, self.inner.config.branch.as_str()];
        let output = self
            .inner
            .git
            .run(&self.inner.repo, &args, PUSH_TIMEOUT)
            .await?;
        if !output.success {
            return Err(SyncError::CommandFailed {
                command: render_command(&args),
                stderr: output.diagnostic().to_string(),
            });
        }

        Ok(clear_pushed(&mut queue))
    }

    /// Push once to `url` with embedded credentials
    ///
    /// The configured remote is left untouched and the secret is scrubbed
    /// from any error text. The pending queue is cleared only when `url` is
    /// the configured remote; a push elsewhere reports `count: 0`.
    ///
    /// # Errors
    /// - `SyncError::Disabled` / `SyncError::NotInitialized`
    /// - `SyncError::MissingCredential` for a blank URL
    /// - `SyncError::Timeout` / `SyncError::CommandFailed`; the queue is unchanged
    pub async fn push_with_credentials(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<PushReport, SyncError> {
        match self.state() {
            SyncState::Disabled => return Err(SyncError::Disabled),
            SyncState::Uninitialized => return Err(SyncError::NotInitialized),
            SyncState::LocalReady | SyncState::RemoteConfigured => {}
        }
        let url = url.trim();
        if url.is_empty() {
            return Err(SyncError::MissingCredential("remote URL"));
        }

        let branch = self.inner.config.branch.as_str();
        let auth_url = credentials.authenticated_url(url);
        let shown = render_command(&["push", url, branch]);

        let mut queue = self.inner.queue.lock().await;
        let output = self
            .inner
            .git
            .run(
                &self.inner.repo,
                &["push", auth_url.as_str(), branch],
                CREDENTIALED_PUSH_TIMEOUT,
            )
            .await
            .map_err(|e| match e {
                SyncError::Timeout { after, .. } => SyncError::Timeout {
                    command: shown.clone(),
                    after,
                },
                SyncError::Spawn { source, .. } => SyncError::Spawn {
                    command: shown.clone(),
                    source,
                },
                other => other,
            })?;

        if !output.success {
            return Err(SyncError::CommandFailed {
                command: shown,
                stderr: credentials.scrub(output.diagnostic()),
            });
        }

        tracing::info!(url, user = credentials.username(), "pushed with credentials");
        if self.is_configured_remote(url) {
            Ok(clear_pushed(&mut queue))
        } else {
            tracing::debug!(pending = queue.pending.len(), "pushed outside the configured remote, queue kept");
            Ok(PushReport::Pushed {
                count: 0,
                at: Utc::now(),
            })
        }
    }

    fn is_configured_remote(&self, url: &str) -> bool {
        self.state() == SyncState::RemoteConfigured && self.inner.config.remote_url.trim() == url
    }

    /// Repository and queue snapshot
    ///
    /// # Errors
    /// Git failures other than an empty repository
    pub async fn status(&self) -> Result<SyncStatus, SyncError> {
        let state = self.state();
        let config = &self.inner.config;
        let (pending, last_push) = {
            let queue = self.inner.queue.lock().await;
            (queue.pending.len(), queue.last_push)
        };

        let ready = matches!(state, SyncState::LocalReady | SyncState::RemoteConfigured);
        let (branch, commit_count) = if ready {
            let branch = self.git(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
            let branch = if branch.success {
                branch.text().to_string()
            } else {
                config.branch.clone()
            };

            let args = ["rev-list", "--count", "HEAD"];
            let count = self.git(&args).await?;
            let commit_count = if count.success {
                count
                    .text()
                    .parse::<u64>()
                    .map_err(|_| SyncError::UnexpectedOutput {
                        command: render_command(&args),
                        output: count.stdout.clone(),
                    })?
            } else {
                0
            };
            (branch, commit_count)
        } else {
            (config.branch.clone(), 0)
        };

        let remote = state == SyncState::RemoteConfigured;
        Ok(SyncStatus {
            state,
            repo_path: self.inner.repo.clone(),
            branch,
            commit_count,
            remote_url: remote.then(|| config.remote_url.clone()),
            push_mode: remote.then_some(config.remote_push_mode),
            pending,
            last_push,
        })
    }

    /// Most recent commits, one line each, newest first
    ///
    /// # Errors
    /// Returns an error only if git cannot be run
    pub async fn history(&self, limit: usize) -> Result<Vec<String>, SyncError> {
        if !matches!(
            self.state(),
            SyncState::LocalReady | SyncState::RemoteConfigured
        ) {
            return Ok(Vec::new());
        }

        let count = format!("-{}", limit.max(1));
        let output = self.git(&["log", count.as_str(), "--oneline"]).await?;
        if !output.success {
            tracing::debug!(error = %output.diagnostic(), "no history");
            return Ok(Vec::new());
        }
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Final push of pending commits, when configured
    ///
    /// Never fails; problems are logged.
    pub async fn shutdown(&self) {
        if !self.inner.config.push_on_shutdown || !self.has_pending().await {
            return;
        }
        if self.state() != SyncState::RemoteConfigured {
            tracing::debug!("pending commits kept locally, no remote configured");
            return;
        }

        tracing::info!("pushing pending commits before shutdown");
        match self.push().await {
            Ok(report) => tracing::info!(%report, "shutdown push finished"),
            Err(e) => tracing::warn!(error = %e, "shutdown push failed"),
        }
    }
}

fn clear_pushed(queue: &mut PushQueue) -> PushReport {
    let count = queue.pending.len();
    queue.pending.clear();
    let at = Utc::now();
    queue.last_push = Some(at);
    tracing::info!(count, "pushed to remote");
    PushReport::Pushed { count, at }
}
