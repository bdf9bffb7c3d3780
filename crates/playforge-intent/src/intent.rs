//! Intent tags and their typed parameter bundles

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Field-less intent tag
///
/// The string form is used for template file names and as the prefix of
/// persisted artifact file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    InstallPackage,
    ConfigureFirewall,
    CreateUser,
    DeployContainer,
    RestartService,
    UpdateConfig,
    Unknown,
}

impl IntentKind {
    /// Intents backed by a template, in resolution priority order
    pub const TEMPLATED: [IntentKind; 6] = [
        IntentKind::InstallPackage,
        IntentKind::ConfigureFirewall,
        IntentKind::CreateUser,
        IntentKind::DeployContainer,
        IntentKind::RestartService,
        IntentKind::UpdateConfig,
    ];

    /// Stable snake_case tag
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::InstallPackage => "install_package",
            IntentKind::ConfigureFirewall => "configure_firewall",
            IntentKind::CreateUser => "create_user",
            IntentKind::DeployContainer => "deploy_container",
            IntentKind::RestartService => "restart_service",
            IntentKind::UpdateConfig => "update_config",
            IntentKind::Unknown => "unknown",
        }
    }

    /// Template document name, `None` for [`IntentKind::Unknown`]
    #[must_use]
    pub fn template_file(&self) -> Option<String> {
        match self {
            IntentKind::Unknown => None,
            other => Some(format!("{}.yml", other.as_str())),
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognised intent tag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intent tag: '{0}'")]
pub struct UnknownIntentKind(pub String);

impl FromStr for IntentKind {
    type Err = UnknownIntentKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntentKind::TEMPLATED
            .iter()
            .chain(std::iter::once(&IntentKind::Unknown))
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownIntentKind(s.to_string()))
    }
}

/// Classified request with its typed parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    InstallPackage {
        package_name: String,
    },
    ConfigureFirewall {
        port: String,
    },
    CreateUser {
        username: String,
    },
    DeployContainer {
        container_name: String,
        image_name: String,
        port: String,
    },
    RestartService {
        service_name: String,
        /// Well-known port of the service, when one is known
        port: Option<String>,
    },
    UpdateConfig {
        config_file: String,
        search_pattern: String,
        replace_line: String,
    },
    Unknown,
}

impl Intent {
    /// Tag of this intent
    #[must_use]
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::InstallPackage { .. } => IntentKind::InstallPackage,
            Intent::ConfigureFirewall { .. } => IntentKind::ConfigureFirewall,
            Intent::CreateUser { .. } => IntentKind::CreateUser,
            Intent::DeployContainer { .. } => IntentKind::DeployContainer,
            Intent::RestartService { .. } => IntentKind::RestartService,
            Intent::UpdateConfig { .. } => IntentKind::UpdateConfig,
            Intent::Unknown => IntentKind::Unknown,
        }
    }

    /// Flatten the typed bundle into `(name, value)` pairs
    ///
    /// Absent optional values are omitted.
    #[must_use]
    pub fn parameter_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Intent::InstallPackage { package_name } => {
                vec![("package_name", package_name.clone())]
            }
            Intent::ConfigureFirewall { port } => vec![("port", port.clone())],
            Intent::CreateUser { username } => vec![("username", username.clone())],
            Intent::DeployContainer {
                container_name,
                image_name,
                port,
            } => vec![
                ("container_name", container_name.clone()),
                ("image_name", image_name.clone()),
                ("port", port.clone()),
            ],
            Intent::RestartService { service_name, port } => {
                let mut pairs = vec![("service_name", service_name.clone())];
                if let Some(port) = port {
                    pairs.push(("port", port.clone()));
                }
                pairs
            }
            Intent::UpdateConfig {
                config_file,
                search_pattern,
                replace_line,
            } => vec![
                ("config_file", config_file.clone()),
                ("search_pattern", search_pattern.clone()),
                ("replace_line", replace_line.clone()),
            ],
            Intent::Unknown => Vec::new(),
        }
    }
}
