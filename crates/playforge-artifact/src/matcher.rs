//! Artifact matching
//!
//! Scores how well a stored artifact covers a request and decides whether
//! the best one is good enough to reuse.
//!
//! The score of an artifact against a parameter set is the fraction of
//! non-meta parameter values that occur, case-insensitively, somewhere in
//! the artifact's re-serialized text.

use chrono::{DateTime, Local};
use playforge_intent::ParameterSet;
use serde_yaml::Value;
use std::path::PathBuf;

/// Top score at or above which an artifact is reused
pub const DEFAULT_REUSE_THRESHOLD: f64 = 0.8;

/// A stored artifact scored against one request
///
/// Computed fresh on every matching pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateArtifact {
    pub file_name: String,
    pub path: PathBuf,
    pub created: Option<DateTime<Local>>,
    pub modified: Option<DateTime<Local>>,
    /// Size in bytes
    pub size: u64,
    pub body: String,
    /// Match score in `[0, 1]`
    pub score: f64,
}

/// Score a parsed document against request parameters
///
/// Returns 0 when there is nothing to check.
#[must_use]
pub fn score_document(document: &Value, params: &ParameterSet) -> f64 {
    let Ok(text) = serde_yaml::to_string(document) else {
        return 0.0;
    };
    let haystack = text.to_lowercase();

    let mut checked = 0_u32;
    let mut found = 0_u32;
    for (_, value) in params.content_params() {
        checked += 1;
        let needle = value.to_lowercase();
        if !needle.is_empty() && haystack.contains(&needle) {
            found += 1;
        }
    }

    if checked == 0 {
        0.0
    } else {
        f64::from(found) / f64::from(checked)
    }
}

/// Order by score descending, then most recently modified first
pub(crate) fn rank(candidates: &mut [CandidateArtifact]) {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.modified.cmp(&a.modified))
    });
}

/// Reuse decision over ranked candidates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReusePolicy {
    threshold: f64,
}

impl ReusePolicy {
    /// Create policy with a custom threshold, clamped to `[0, 1]`
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    #[inline]
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether a score is high enough to reuse
    #[inline]
    #[must_use]
    pub fn should_reuse(&self, score: f64) -> bool {
        score >= self.threshold
    }

    /// Top candidate if it clears the threshold
    ///
    /// `candidates` must already be ranked.
    #[must_use]
    pub fn select<'a>(&self, candidates: &'a [CandidateArtifact]) -> Option<&'a CandidateArtifact> {
        candidates
            .first()
            .filter(|candidate| self.should_reuse(candidate.score))
    }
}

impl Default for ReusePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_REUSE_THRESHOLD)
    }
}
