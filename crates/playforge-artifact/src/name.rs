//! Artifact file naming
//!
//! `<intent>_<os_type>_<YYYYMMDD_HHMMSS>.yml`, local time, second resolution.

use chrono::{DateTime, Duration, Local, NaiveDateTime};
use playforge_intent::IntentKind;
use std::fmt;

/// `strftime` format of the timestamp segment
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const TIMESTAMP_WIDTH: usize = 15;

/// Name of one persisted artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    intent: IntentKind,
    os_type: String,
    timestamp: NaiveDateTime,
}

impl ArtifactName {
    /// Name for an artifact created at `at`
    ///
    /// Spaces in the OS family (`amazon linux`) become `-` so the name stays
    /// a single shell word.
    #[must_use]
    pub fn at(intent: IntentKind, os_type: &str, at: DateTime<Local>) -> Self {
        Self {
            intent,
            os_type: os_type.trim().replace(' ', "-"),
            timestamp: at.naive_local(),
        }
    }

    /// Name for an artifact created now
    #[must_use]
    pub fn now(intent: IntentKind, os_type: &str) -> Self {
        Self::at(intent, os_type, Local::now())
    }

    /// Same name one second later
    #[must_use]
    pub fn next_second(&self) -> Self {
        Self {
            intent: self.intent,
            os_type: self.os_type.clone(),
            timestamp: self.timestamp + Duration::seconds(1),
        }
    }

    #[inline]
    #[must_use]
    pub fn intent(&self) -> IntentKind {
        self.intent
    }

    #[inline]
    #[must_use]
    pub fn os_type(&self) -> &str {
        &self.os_type
    }

    /// Prefix shared by every artifact of an intent
    #[must_use]
    pub fn prefix_for(intent: IntentKind) -> String {
        format!("{}_", intent.as_str())
    }

    /// Parse a file name following the convention
    ///
    /// Returns `None` for anything else, including names whose intent tag
    /// is not recognised.
    #[must_use]
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name
            .strip_suffix(".yml")
            .or_else(|| file_name.strip_suffix(".yaml"))?;
        // timestamp is the fixed-width tail `YYYYMMDD_HHMMSS`
        let split = stem.len().checked_sub(TIMESTAMP_WIDTH + 1)?;
        if !stem.is_char_boundary(split) {
            return None;
        }
        let (head, tail) = stem.split_at(split);
        let stamp = tail.strip_prefix('_')?;
        let timestamp = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;

        let (intent, os_type) = IntentKind::TEMPLATED
            .iter()
            .chain(std::iter::once(&IntentKind::Unknown))
            .find_map(|kind| {
                head.strip_prefix(kind.as_str())
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|os| (*kind, os))
            })?;
        if os_type.is_empty() {
            return None;
        }

        Some(Self {
            intent,
            os_type: os_type.to_string(),
            timestamp,
        })
    }

    /// File name on disk
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.yml",
            self.intent.as_str(),
            self.os_type,
            self.timestamp.format(TIMESTAMP_FORMAT)
        )
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}
