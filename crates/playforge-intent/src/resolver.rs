//! Intent resolution
//!
//! Pure function over the request text: no I/O, no shared state.

use crate::intent::{Intent, IntentKind};
use crate::params::{ParameterSet, DEFAULT_TARGET};
use crate::patterns::{self, INTENT_PATTERNS, OS_KEYWORDS};
use regex::Captures;
use serde::{Deserialize, Serialize};

/// How sure the resolver is about the classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// A fixed pattern matched
    High,
    /// Nothing matched
    None,
}

/// Directive for the generation step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationRoute {
    /// Deterministic template filling
    Template,
    /// Free-form fallback generation is required
    FallbackRequired,
}

impl From<Confidence> for GenerationRoute {
    fn from(confidence: Confidence) -> Self {
        match confidence {
            Confidence::High => GenerationRoute::Template,
            Confidence::None => GenerationRoute::FallbackRequired,
        }
    }
}

/// Outcome of resolving one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Classified intent with its typed parameters
    pub intent: Intent,
    /// `High` iff a pattern matched
    pub confidence: Confidence,
    /// Detected operating-system family (`all` when none)
    pub os_type: String,
    /// Target host group, always the whole inventory
    pub target_hosts: String,
    /// Which generation path downstream must take
    pub route: GenerationRoute,
}

impl Resolution {
    /// Intent tag
    #[inline]
    #[must_use]
    pub fn kind(&self) -> IntentKind {
        self.intent.kind()
    }

    /// Whether a fixed pattern matched
    #[inline]
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.confidence == Confidence::High
    }

    /// Flattened parameters, meta-parameters included
    #[must_use]
    pub fn parameters(&self) -> ParameterSet {
        self.intent.parameter_pairs().into_iter().fold(
            ParameterSet::new(self.os_type.clone(), self.target_hosts.clone()),
            |params, (key, value)| params.with(key, value),
        )
    }
}

/// Fixed-pattern intent resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentResolver;

impl IntentResolver {
    /// Create new resolver
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolve free text into an intent
    ///
    /// Intents are tried in declared order and the first matching pattern
    /// wins, regardless of where in the text another intent would match.
    #[must_use]
    pub fn resolve(&self, text: &str) -> Resolution {
        let normalized = text.trim().to_lowercase();
        let os_type = detect_os(&normalized).to_string();
        let target_hosts = DEFAULT_TARGET.to_string();

        for (kind, regexes) in INTENT_PATTERNS.iter() {
            for regex in regexes {
                if let Some(caps) = regex.captures(&normalized) {
                    tracing::debug!(intent = %kind, pattern = regex.as_str(), "intent pattern matched");
                    return Resolution {
                        intent: extract(*kind, &caps),
                        confidence: Confidence::High,
                        os_type,
                        target_hosts,
                        route: GenerationRoute::Template,
                    };
                }
            }
        }

        tracing::debug!("no intent pattern matched");
        Resolution {
            intent: Intent::Unknown,
            confidence: Confidence::None,
            os_type,
            target_hosts,
            route: GenerationRoute::FallbackRequired,
        }
    }
}

/// First OS keyword contained in the text, or `all`
fn detect_os(normalized: &str) -> &'static str {
    OS_KEYWORDS
        .iter()
        .find(|keyword| normalized.contains(*keyword))
        .copied()
        .unwrap_or(DEFAULT_TARGET)
}

fn extract(kind: IntentKind, caps: &Captures<'_>) -> Intent {
    let captured = caps
        .get(1)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    match kind {
        IntentKind::InstallPackage => Intent::InstallPackage {
            package_name: captured,
        },
        IntentKind::ConfigureFirewall => Intent::ConfigureFirewall { port: captured },
        IntentKind::CreateUser => Intent::CreateUser { username: captured },
        IntentKind::DeployContainer => Intent::DeployContainer {
            image_name: patterns::container_image(&captured),
            port: patterns::container_port(&captured),
            container_name: captured,
        },
        IntentKind::RestartService => Intent::RestartService {
            port: patterns::service_port(&captured),
            service_name: captured,
        },
        IntentKind::UpdateConfig => Intent::UpdateConfig {
            config_file: captured,
            search_pattern: String::new(),
            replace_line: String::new(),
        },
        IntentKind::Unknown => Intent::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolve(text: &str) -> Resolution {
        IntentResolver::new().resolve(text)
    }

    #[test]
    fn install_nginx_on_ubuntu() {
        let resolution = resolve("Install nginx on Ubuntu");

        assert_eq!(
            resolution.intent,
            Intent::InstallPackage {
                package_name: "nginx".to_string()
            }
        );
        assert_eq!(resolution.confidence, Confidence::High);
        assert_eq!(resolution.route, GenerationRoute::Template);
        assert_eq!(resolution.os_type, "ubuntu");
        assert_eq!(resolution.target_hosts, "all");

        let params = resolution.parameters();
        assert_eq!(params.get("package_name"), Some("nginx"));
        assert_eq!(params.os_type(), "ubuntu");
        assert_eq!(params.target_hosts(), "all");
    }

    #[test]
    fn unknown_request_routes_to_fallback() {
        let resolution = resolve("Setup-free HAProxy tuning please");
        assert_eq!(resolution.intent, Intent::Unknown);
        assert_eq!(resolution.confidence, Confidence::None);
        assert_eq!(resolution.route, GenerationRoute::FallbackRequired);
        assert_eq!(resolution.parameters().content_params().count(), 0);
    }

    #[test]
    fn os_defaults_to_all() {
        assert_eq!(resolve("open port 443").os_type, "all");
    }

    #[test]
    fn first_os_keyword_wins() {
        // "alma" is declared before "almalinux"
        assert_eq!(resolve("install git on almalinux").os_type, "alma");
        assert_eq!(resolve("install git on Debian or RHEL").os_type, "debian");
    }

    #[test]
    fn firewall_port_extracted() {
        let resolution = resolve("Open port 8080 on RHEL");
        assert_eq!(
            resolution.intent,
            Intent::ConfigureFirewall {
                port: "8080".to_string()
            }
        );
        assert_eq!(resolution.os_type, "rhel");
    }

    #[test]
    fn create_user_extracted() {
        let resolution = resolve("Create user john on CentOS");
        assert_eq!(
            resolution.intent,
            Intent::CreateUser {
                username: "john".to_string()
            }
        );
    }

    #[test]
    fn container_defaults_from_tables() {
        let resolution = resolve("Deploy redis container on Fedora");
        assert_eq!(
            resolution.intent,
            Intent::DeployContainer {
                container_name: "redis".to_string(),
                image_name: "redis:latest".to_string(),
                port: "6379".to_string(),
            }
        );

        let resolution = resolve("launch mongodb container");
        assert_eq!(
            resolution.parameters().get("image_name"),
            Some("mongo:latest")
        );
    }

    #[test]
    fn container_defaults_fall_back() {
        let resolution = resolve("deploy grafana container");
        assert_eq!(
            resolution.intent,
            Intent::DeployContainer {
                container_name: "grafana".to_string(),
                image_name: "grafana:latest".to_string(),
                port: "8080".to_string(),
            }
        );
    }

    #[test]
    fn restart_guesses_service_port() {
        let resolution = resolve("Restart apache2 now");
        assert_eq!(
            resolution.intent,
            Intent::RestartService {
                service_name: "apache2".to_string(),
                port: Some("80".to_string()),
            }
        );

        let resolution = resolve("bounce cron service");
        assert_eq!(
            resolution.intent,
            Intent::RestartService {
                service_name: "cron".to_string(),
                port: None,
            }
        );
    }

    #[test]
    fn update_config_captures_rest_of_text() {
        let resolution = resolve("Update configuration /etc/ssh/sshd_config");
        assert_eq!(
            resolution.intent,
            Intent::UpdateConfig {
                config_file: "/etc/ssh/sshd_config".to_string(),
                search_pattern: String::new(),
                replace_line: String::new(),
            }
        );
    }

    #[test]
    fn declared_intent_order_beats_text_position() {
        // create_user appears first in the text, install_package is declared first
        let resolution = resolve("create user bob then install vim");
        assert_eq!(resolution.kind(), IntentKind::InstallPackage);
        assert_eq!(resolution.parameters().get("package_name"), Some("vim"));
    }

    #[test]
    fn declared_pattern_order_within_intent() {
        // "setup account for" belongs to create_user but install's "setup" pattern is earlier
        let resolution = resolve("setup account for alice");
        assert_eq!(resolution.kind(), IntentKind::InstallPackage);
    }

    #[test]
    fn input_is_trimmed_and_lowercased() {
        let resolution = resolve("   INSTALL Docker   ");
        assert_eq!(resolution.parameters().get("package_name"), Some("docker"));
    }
}
