//! Scripted git runner

use parking_lot::Mutex;
use playforge_sync::git::render_command;
use playforge_sync::{GitOutput, GitRunner, SyncError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// One recorded invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCall {
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl GitCall {
    #[must_use]
    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        self.args.len() >= prefix.len() && self.args.iter().zip(prefix).all(|(a, p)| a == p)
    }

    #[must_use]
    pub fn command(&self) -> String {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        render_command(&args)
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Output(GitOutput),
    Timeout,
}

#[derive(Debug)]
struct Rule {
    prefix: Vec<String>,
    reply: Reply,
    once: bool,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<GitCall>,
    rules: Vec<Rule>,
    remote_url: Option<String>,
    commits: Vec<String>,
}

/// In-memory stand-in for the `git` binary
///
/// Unscripted commands behave like a fresh repository: `init` creates a
/// `.git` directory, `commit` records a commit, `rev-parse`, `rev-list` and
/// `log` report on the recorded commits, `remote` tracks one URL.
/// Scripted replies (latest first) take precedence.
#[derive(Debug, Clone, Default)]
pub struct FakeGit {
    state: Arc<Mutex<State>>,
}

impl FakeGit {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `output` to every command starting with `prefix`
    pub fn respond(&self, prefix: &[&str], output: GitOutput) -> &Self {
        self.add_rule(prefix, Reply::Output(output), false)
    }

    /// Reply with `output` to the next command starting with `prefix`
    pub fn respond_once(&self, prefix: &[&str], output: GitOutput) -> &Self {
        self.add_rule(prefix, Reply::Output(output), true)
    }

    /// Time out every command starting with `prefix`
    pub fn time_out(&self, prefix: &[&str]) -> &Self {
        self.add_rule(prefix, Reply::Timeout, false)
    }

    /// Time out the next command starting with `prefix`
    pub fn time_out_once(&self, prefix: &[&str]) -> &Self {
        self.add_rule(prefix, Reply::Timeout, true)
    }

    /// Drop all scripted replies
    pub fn reset_rules(&self) {
        self.state.lock().rules.clear();
    }

    fn add_rule(&self, prefix: &[&str], reply: Reply, once: bool) -> &Self {
        self.state.lock().rules.push(Rule {
            prefix: prefix.iter().map(ToString::to_string).collect(),
            reply,
            once,
        });
        self
    }

    #[must_use]
    pub fn calls(&self) -> Vec<GitCall> {
        self.state.lock().calls.clone()
    }

    #[must_use]
    pub fn count_matching(&self, prefix: &[&str]) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    /// Every `push` invocation
    #[must_use]
    pub fn pushes(&self) -> Vec<GitCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.starts_with(&["push"]))
            .cloned()
            .collect()
    }

    /// Messages of recorded commits, oldest first
    #[must_use]
    pub fn commit_messages(&self) -> Vec<String> {
        self.state.lock().commits.clone()
    }

    #[must_use]
    pub fn remote_url(&self) -> Option<String> {
        self.state.lock().remote_url.clone()
    }
}

fn short_hash(index: usize) -> String {
    format!("abc{index:04}")
}

impl State {
    fn scripted(&mut self, args: &[String]) -> Option<Reply> {
        let position = self.rules.iter().rposition(|rule| {
            args.len() >= rule.prefix.len() && args.iter().zip(&rule.prefix).all(|(a, p)| a == p)
        })?;
        let reply = self.rules[position].reply.clone();
        if self.rules[position].once {
            self.rules.remove(position);
        }
        Some(reply)
    }

    fn default_reply(&mut self, repo: &Path, args: &[&str]) -> GitOutput {
        match args {
            ["init", ..] => match std::fs::create_dir_all(repo.join(".git")) {
                Ok(()) => GitOutput::ok("Initialized empty Git repository\n"),
                Err(e) => GitOutput::failed(e.to_string()),
            },
            ["remote", "get-url", _] => match &self.remote_url {
                Some(url) => GitOutput::ok(format!("{url}\n")),
                None => GitOutput::failed("error: No such remote 'origin'"),
            },
            ["remote", "add" | "set-url", _, url] => {
                self.remote_url = Some((*url).to_string());
                GitOutput::ok("")
            }
            ["commit", "-m", message] => {
                self.commits.push((*message).to_string());
                GitOutput::ok(format!(
                    "[main {}] {message}\n",
                    short_hash(self.commits.len())
                ))
            }
            ["rev-parse", "--short", "HEAD"] if !self.commits.is_empty() => {
                GitOutput::ok(format!("{}\n", short_hash(self.commits.len())))
            }
            ["rev-parse", "--abbrev-ref", "HEAD"] => GitOutput::ok("main\n"),
            ["rev-parse", ..] | ["rev-list", ..] if self.commits.is_empty() => {
                GitOutput::failed("fatal: ambiguous argument 'HEAD': unknown revision")
            }
            ["rev-list", "--count", "HEAD"] => GitOutput::ok(format!("{}\n", self.commits.len())),
            ["log", count, "--oneline"] => {
                let limit = count
                    .trim_start_matches('-')
                    .parse::<usize>()
                    .unwrap_or(usize::MAX);
                let lines: Vec<String> = self
                    .commits
                    .iter()
                    .enumerate()
                    .rev()
                    .take(limit)
                    .map(|(idx, message)| format!("{} {message}", short_hash(idx + 1)))
                    .collect();
                GitOutput::ok(lines.join("\n"))
            }
            _ => GitOutput::ok(""),
        }
    }
}

#[async_trait::async_trait]
impl GitRunner for FakeGit {
    async fn run(
        &self,
        repo: &Path,
        args: &[&str],
        limit: Duration,
    ) -> Result<GitOutput, SyncError> {
        let owned: Vec<String> = args.iter().map(ToString::to_string).collect();
        let mut state = self.state.lock();
        state.calls.push(GitCall {
            args: owned.clone(),
            timeout: limit,
        });

        match state.scripted(&owned) {
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::Timeout) => Err(SyncError::Timeout {
                command: render_command(args),
                after: limit,
            }),
            None => Ok(state.default_reply(repo, args)),
        }
    }
}
