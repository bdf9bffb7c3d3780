//! Agent configuration
//!
//! One YAML document, every section optional. Missing keys take their
//! defaults; the `git` section is handed to the Sync Manager untouched.

use playforge_artifact::DEFAULT_REUSE_THRESHOLD;
use playforge_generate::OllamaSettings;
use playforge_sync::SyncConfig;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yml";

/// Default `logging.file`
pub const DEFAULT_LOG_FILE: &str = "logs/playforge.log";

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A value is out of range
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// `hybrid_mode` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridMode {
    /// Allow the fallback generation route for unrecognized requests
    pub enabled: bool,
}

impl Default for HybridMode {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// `validator` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorSettings {
    /// Run the external syntax check
    pub enabled: bool,
    pub program: PathBuf,
    pub timeout_secs: u64,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            program: PathBuf::from("ansible-playbook"),
            timeout_secs: 10,
        }
    }
}

impl ValidatorSettings {
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `matcher` section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherSettings {
    pub reuse_threshold: f64,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            reuse_threshold: DEFAULT_REUSE_THRESHOLD,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// `logging` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
    /// Append-only log file, `null` to disable
    pub file: Option<PathBuf>,
    /// Also log to stderr
    pub console: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            console: true,
        }
    }
}

/// Complete agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Artifact store, also the git repository
    pub output_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub hybrid_mode: HybridMode,
    pub ollama: OllamaSettings,
    pub validator: ValidatorSettings,
    pub matcher: MatcherSettings,
    pub logging: LoggingSettings,
    pub git: SyncConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            templates_dir: PathBuf::from("templates"),
            hybrid_mode: HybridMode::default(),
            ollama: OllamaSettings::default(),
            validator: ValidatorSettings::default(),
            matcher: MatcherSettings::default(),
            logging: LoggingSettings::default(),
            git: SyncConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from `path`
    ///
    /// A missing or empty file yields the defaults.
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file exists but cannot be read
    /// - `ConfigError::Parse` / `ConfigError::Invalid` for bad content
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no configuration file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.check()?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parse configuration text
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` / `ConfigError::Invalid` for bad content
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config = Self::parse(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.check()?;
        Ok(config)
    }

    fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        match serde_yaml::from_str::<Value>(text)? {
            Value::Null => Ok(Self::default()),
            value => serde_yaml::from_value(value),
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        let threshold = self.matcher.reuse_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid {
                key: "matcher.reuse_threshold",
                reason: format!("{threshold} is outside [0, 1]"),
            });
        }
        if self.validator.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "validator.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playforge_sync::PushMode;
    use tempfile::TempDir;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(AgentConfig::from_yaml("").unwrap(), AgentConfig::default());
        assert_eq!(AgentConfig::from_yaml("---\n").unwrap(), AgentConfig::default());
    }

    #[test]
    fn sections_merge_with_defaults() {
        let config = AgentConfig::from_yaml(
            "output_dir: /srv/playbooks\nhybrid_mode:\n  enabled: false\nlogging:\n  format: json\ngit:\n  remote_enabled: true\n  remote_url: https://git.example.com/ops/playbooks.git\n  remote_push_mode: immediate\n",
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("/srv/playbooks"));
        assert!(!config.hybrid_mode.enabled);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.git.remote_push_mode, PushMode::Immediate);
        assert_eq!(config.git.branch, "main");
        assert_eq!(config.ollama.model, "codellama:7b");
        assert_eq!(config.validator.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn log_file_can_be_moved_or_disabled() {
        let config = AgentConfig::from_yaml("logging:\n  level: debug\n").unwrap();
        assert_eq!(config.logging.file, Some(PathBuf::from(DEFAULT_LOG_FILE)));
        assert!(config.logging.console);

        let config =
            AgentConfig::from_yaml("logging:\n  file: /var/log/playforge.log\n  console: false\n")
                .unwrap();
        assert_eq!(config.logging.file, Some(PathBuf::from("/var/log/playforge.log")));
        assert!(!config.logging.console);

        let config = AgentConfig::from_yaml("logging:\n  file: null\n").unwrap();
        assert_eq!(config.logging.file, None);
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let err = AgentConfig::from_yaml("matcher:\n  reuse_threshold: 1.5\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "matcher.reuse_threshold",
                ..
            }
        ));
    }

    #[test]
    fn malformed_document_rejected() {
        let err = AgentConfig::from_yaml("git: [unterminated").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AgentConfig::load(dir.path().join("absent.yml")).await.unwrap();
        assert_eq!(config, AgentConfig::default());
    }

    #[tokio::test]
    async fn parse_error_names_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "matcher: {reuse_threshold: nope}\n").unwrap();

        let err = AgentConfig::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("config.yml"));
    }
}
