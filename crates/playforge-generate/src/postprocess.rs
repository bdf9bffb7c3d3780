//! Post-processing of generated bodies
//!
//! 1. Strip markdown code fences, keeping fenced content and stray YAML lines
//! 2. Guarantee a leading `---` document marker
//! 3. Parse; if that fails, make exactly one repair attempt (tabs to spaces,
//!    trailing whitespace trimmed, re-parse, re-serialize)
//!
//! A body that is still malformed after the repair is kept as-is and left to
//! the external validator.

use playforge_artifact::{Playbook, PlaybookError};
use serde::Serialize;
use serde_yaml::Value;

const DOCUMENT_MARKER: &str = "---";

/// Result of the single bounded repair step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairOutcome {
    /// Parsed on the first attempt
    WellFormed,
    /// Parsed after the repair pass and was re-serialized
    Repaired,
    /// Still malformed, body kept unchanged
    LeftAsIs,
}

impl RepairOutcome {
    /// Whether the body is well-formed YAML
    #[inline]
    #[must_use]
    pub fn is_parseable(&self) -> bool {
        !matches!(self, Self::LeftAsIs)
    }
}

/// A cleaned body and what is known about it
#[derive(Debug)]
pub struct Normalized {
    pub body: String,
    pub outcome: RepairOutcome,
    /// Typed playbook, or why the body does not fit the schema
    pub schema: Result<Playbook, PlaybookError>,
}

/// Keep the content of fenced code blocks
///
/// Outside a fence, only list items and `name:` lines survive. Text without
/// fences is returned unchanged. An unterminated fence keeps everything after it.
#[must_use]
pub fn strip_fences(text: &str) -> String {
    if !text.contains("```") {
        return text.to_string();
    }

    let mut inside = false;
    let mut kept = Vec::new();
    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            inside = !inside;
            continue;
        }
        if inside || looks_like_yaml(line) {
            kept.push(line);
        }
    }
    kept.join("\n")
}

fn looks_like_yaml(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with('-') || line.starts_with("name:")
}

/// Prefix `---` unless the text already starts with it
#[must_use]
pub fn ensure_header(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with(DOCUMENT_MARKER) {
        trimmed.to_string()
    } else {
        format!("{DOCUMENT_MARKER}\n{trimmed}")
    }
}

fn tidy(text: &str) -> String {
    text.lines()
        .map(|line| line.replace('\t', "  ").trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn typed(value: Value) -> Result<Playbook, PlaybookError> {
    Playbook::from_value(value)
}

/// Clean a raw body and make one repair attempt if needed
#[must_use]
pub fn normalize(raw: &str) -> Normalized {
    let cleaned = ensure_header(&strip_fences(raw));

    let first_error = match serde_yaml::from_str::<Value>(&cleaned) {
        Ok(value) => {
            return Normalized {
                body: cleaned,
                outcome: RepairOutcome::WellFormed,
                schema: typed(value),
            };
        }
        Err(e) => e,
    };

    tracing::warn!(error = %first_error, "generated body is not well-formed, attempting repair");
    let repaired = tidy(&cleaned);
    let reserialized = serde_yaml::from_str::<Value>(&repaired).and_then(|value| {
        serde_yaml::to_string(&value).map(|text| (value, text))
    });

    match reserialized {
        Ok((value, text)) => {
            tracing::info!("generated body repaired");
            Normalized {
                body: format!("{DOCUMENT_MARKER}\n{text}"),
                outcome: RepairOutcome::Repaired,
                schema: typed(value),
            }
        }
        Err(_) => {
            tracing::warn!("repair failed, keeping body as-is for the validator");
            Normalized {
                body: cleaned,
                outcome: RepairOutcome::LeftAsIs,
                schema: Err(PlaybookError::Syntax(first_error)),
            }
        }
    }
}
