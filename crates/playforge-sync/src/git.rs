//! Git invocation seam
//!
//! All version-control work goes through [`GitRunner`], one subcommand per
//! call, each bounded by a timeout. [`CliGit`] spawns the `git` binary; tests
//! plug in a scripted runner instead.

use crate::error::SyncError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::timeout;

/// Captured result of one git invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    /// Successful run with `stdout`
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed run with `stderr`
    #[must_use]
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Trimmed stdout
    #[must_use]
    pub fn text(&self) -> &str {
        self.stdout.trim()
    }

    /// Best diagnostic: stderr, or stdout when stderr is empty
    #[must_use]
    pub fn diagnostic(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// Runs git subcommands against a repository
#[async_trait::async_trait]
pub trait GitRunner: Send + Sync {
    /// Run `git <args>` in `repo`
    ///
    /// A non-zero exit is a normal [`GitOutput`]; only failing to run the
    /// command at all, or running out of time, is an error.
    async fn run(
        &self,
        repo: &Path,
        args: &[&str],
        limit: Duration,
    ) -> Result<GitOutput, SyncError>;
}

/// Render `git <args>` for messages
#[must_use]
pub fn render_command(args: &[&str]) -> String {
    std::iter::once("git")
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The `git` command-line client
#[derive(Debug, Clone)]
pub struct CliGit {
    program: PathBuf,
}

impl CliGit {
    /// Use `git` from `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }

    /// Use a specific git binary
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CliGit {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl GitRunner for CliGit {
    async fn run(
        &self,
        repo: &Path,
        args: &[&str],
        limit: Duration,
    ) -> Result<GitOutput, SyncError> {
        tracing::debug!(repo = %repo.display(), command = %render_command(args), "running git");

        let child = tokio::process::Command::new(&self.program)
            .arg("-C")
            .arg(repo)
            .args(args)
            .kill_on_drop(true)
            .output();

        let output = timeout(limit, child)
            .await
            .map_err(|_| SyncError::Timeout {
                command: render_command(args),
                after: limit,
            })?
            .map_err(|source| SyncError::Spawn {
                command: render_command(args),
                source,
            })?;

        Ok(GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
