//! Fixed recognition tables
//!
//! Declaration order is resolution priority: intents are tried top to bottom
//! and the first matching pattern wins.

use crate::intent::IntentKind;
use once_cell::sync::Lazy;
use regex::Regex;

/// OS keywords, first substring hit wins
pub(crate) const OS_KEYWORDS: [&str; 9] = [
    "ubuntu",
    "debian",
    "rhel",
    "centos",
    "rocky",
    "alma",
    "almalinux",
    "fedora",
    "amazon linux",
];

const PATTERN_SOURCES: [(IntentKind, &[&str]); 6] = [
    (
        IntentKind::InstallPackage,
        &[r"install\s+(\w+)", r"setup\s+(\w+)", r"add\s+(\w+)\s+package"],
    ),
    (
        IntentKind::ConfigureFirewall,
        &[
            r"open\s+port\s+(\d+)",
            r"allow\s+port\s+(\d+)",
            r"configure\s+firewall.*port\s+(\d+)",
            r"enable\s+port\s+(\d+)",
        ],
    ),
    (
        IntentKind::CreateUser,
        &[
            r"create\s+user\s+(\w+)",
            r"add\s+user\s+(\w+)",
            r"setup\s+account\s+for\s+(\w+)",
            r"new\s+user\s+(\w+)",
        ],
    ),
    (
        IntentKind::DeployContainer,
        &[
            r"deploy\s+(\w+)\s+container",
            r"run\s+(\w+)\s+in\s+docker",
            r"start\s+(\w+)\s+docker",
            r"launch\s+(\w+)\s+container",
        ],
    ),
    (
        IntentKind::RestartService,
        &[
            r"restart\s+(\w+)",
            r"reload\s+(\w+)",
            r"bounce\s+(\w+)\s+service",
            r"reboot\s+(\w+)\s+service",
        ],
    ),
    (
        IntentKind::UpdateConfig,
        &[
            r"update\s+config(?:uration)?\s+(.+)",
            r"modify\s+(.+)\s+config",
            r"change\s+(.+)\s+setting",
        ],
    ),
];

/// Compiled pattern table, in priority order
pub(crate) static INTENT_PATTERNS: Lazy<Vec<(IntentKind, Vec<Regex>)>> = Lazy::new(|| {
    PATTERN_SOURCES
        .iter()
        .map(|(kind, sources)| {
            let compiled = sources
                .iter()
                .map(|src| Regex::new(src).expect("static intent pattern compiles"))
                .collect();
            (*kind, compiled)
        })
        .collect()
});

static CONTAINER_IMAGES: [(&str, &str); 6] = [
    ("nginx", "nginx:latest"),
    ("apache", "httpd:latest"),
    ("mysql", "mysql:latest"),
    ("postgres", "postgres:latest"),
    ("redis", "redis:latest"),
    ("mongodb", "mongo:latest"),
];

static CONTAINER_PORTS: [(&str, &str); 6] = [
    ("nginx", "80"),
    ("apache", "80"),
    ("mysql", "3306"),
    ("postgres", "5432"),
    ("redis", "6379"),
    ("mongodb", "27017"),
];

static SERVICE_PORTS: [(&str, &str); 7] = [
    ("nginx", "80"),
    ("apache", "80"),
    ("apache2", "80"),
    ("mysql", "3306"),
    ("postgresql", "5432"),
    ("redis", "6379"),
    ("ssh", "22"),
];

/// Fallback exposed port for containers missing from the table
pub(crate) const DEFAULT_CONTAINER_PORT: &str = "8080";

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| *value)
}

/// Default image for a container name
pub(crate) fn container_image(name: &str) -> String {
    lookup(&CONTAINER_IMAGES, name)
        .map_or_else(|| format!("{name}:latest"), str::to_string)
}

/// Default exposed port for a container name
pub(crate) fn container_port(name: &str) -> String {
    lookup(&CONTAINER_PORTS, name)
        .unwrap_or(DEFAULT_CONTAINER_PORT)
        .to_string()
}

/// Well-known port of a service, if any
pub(crate) fn service_port(name: &str) -> Option<String> {
    lookup(&SERVICE_PORTS, name).map(str::to_string)
}
