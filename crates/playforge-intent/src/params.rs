//! Parameter bundles shared between resolution, matching and templating
//!
//! Every parameter set carries two meta-parameters, `os_type` and
//! `target_hosts`. They describe where a playbook runs rather than what it
//! does, so matching skips them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of the detected operating-system family
pub const OS_TYPE_KEY: &str = "os_type";

/// Key of the inventory host group a playbook targets
pub const TARGET_HOSTS_KEY: &str = "target_hosts";

/// Meta-parameter keys, excluded from artifact matching
pub const META_KEYS: [&str; 2] = [OS_TYPE_KEY, TARGET_HOSTS_KEY];

/// Default value for both meta-parameters
pub const DEFAULT_TARGET: &str = "all";

/// Ordered mapping of parameter name to string value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet {
    values: BTreeMap<String, String>,
}

impl ParameterSet {
    /// Create a set holding only the two meta-parameters
    #[must_use]
    pub fn new(os_type: impl Into<String>, target_hosts: impl Into<String>) -> Self {
        let mut values = BTreeMap::new();
        values.insert(OS_TYPE_KEY.to_string(), os_type.into());
        values.insert(TARGET_HOSTS_KEY.to_string(), target_hosts.into());
        Self { values }
    }

    /// Add or overwrite a parameter (builder form)
    #[inline]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.enrich(key, value);
        self
    }

    /// Add or overwrite a parameter
    ///
    /// Used by later collection steps before a playbook is generated.
    pub fn enrich(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Look up a parameter value
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Target operating-system family
    #[must_use]
    pub fn os_type(&self) -> &str {
        self.get(OS_TYPE_KEY).unwrap_or(DEFAULT_TARGET)
    }

    /// Target host group
    #[must_use]
    pub fn target_hosts(&self) -> &str {
        self.get(TARGET_HOSTS_KEY).unwrap_or(DEFAULT_TARGET)
    }

    /// Whether `key` is one of the meta-parameters
    #[inline]
    #[must_use]
    pub fn is_meta(key: &str) -> bool {
        META_KEYS.contains(&key)
    }

    /// All parameters, meta included
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parameters that describe the change itself
    pub fn content_params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(k, _)| !Self::is_meta(k))
    }

    /// Number of parameters, meta included
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false: the meta-parameters are always present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET, DEFAULT_TARGET)
    }
}
