//! `git` configuration section

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// When local commits propagate to the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushMode {
    Immediate,
    #[default]
    Manual,
    Scheduled,
}

impl PushMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PushMode::Immediate => "immediate",
            PushMode::Manual => "manual",
            PushMode::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for PushMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default commit message; `{filename}` and `{timestamp}` are substituted
pub const DEFAULT_COMMIT_MESSAGE: &str = "Add playbook: {filename} - {timestamp}";

/// Sync Manager settings, read once at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Master switch for version control
    pub enabled: bool,
    /// Commit each new artifact
    pub auto_commit: bool,
    pub remote_enabled: bool,
    pub remote_push_mode: PushMode,
    pub remote_url: String,
    pub branch: String,
    /// Seconds between scheduled pushes
    pub push_interval: u64,
    pub commit_message_template: String,
    /// Push pending commits once on shutdown
    pub push_on_shutdown: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_commit: true,
            remote_enabled: false,
            remote_push_mode: PushMode::Manual,
            remote_url: String::new(),
            branch: "main".to_string(),
            push_interval: 3600,
            commit_message_template: DEFAULT_COMMIT_MESSAGE.to_string(),
            push_on_shutdown: true,
        }
    }
}

impl SyncConfig {
    /// Remote enabled with a URL to push to
    #[must_use]
    pub fn remote_configured(&self) -> bool {
        self.remote_enabled && !self.remote_url.trim().is_empty()
    }

    /// Scheduler period, never zero
    #[must_use]
    pub fn push_period(&self) -> Duration {
        Duration::from_secs(self.push_interval.max(1))
    }

    /// Expand the commit message template
    #[must_use]
    pub fn commit_message(&self, filename: &str, timestamp: &str) -> String {
        self.commit_message_template
            .replace("{filename}", filename)
            .replace("{timestamp}", timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert!(config.enabled && config.auto_commit && config.push_on_shutdown);
        assert!(!config.remote_configured());
        assert_eq!(config.remote_push_mode, PushMode::Manual);
        assert_eq!(config.branch, "main");
        assert_eq!(config.push_period(), Duration::from_secs(3600));
    }

    #[test]
    fn partial_section_parses() {
        let config: SyncConfig = serde_yaml::from_str(
            "remote_enabled: true\nremote_push_mode: scheduled\nremote_url: https://git.example.com/ops/playbooks.git\npush_interval: 0\n",
        )
        .unwrap();

        assert!(config.remote_configured());
        assert_eq!(config.remote_push_mode, PushMode::Scheduled);
        assert_eq!(config.push_period(), Duration::from_secs(1));
        assert!(config.auto_commit);
    }

    #[test]
    fn commit_message_expansion() {
        let config = SyncConfig::default();
        assert_eq!(
            config.commit_message("a.yml", "2024-01-01 00:00:00"),
            "Add playbook: a.yml - 2024-01-01 00:00:00"
        );
    }

    #[test]
    fn blank_url_is_not_configured() {
        let config = SyncConfig {
            remote_enabled: true,
            remote_url: "  ".to_string(),
            ..SyncConfig::default()
        };
        assert!(!config.remote_configured());
    }
}
