//! Playforge Generation Strategy Selector
//!
//! Turns a resolved request into a playbook body.
//!
//! # Strategies
//!
//! - **Template**: a matched intent fills `templates/<intent>.yml`; unresolved
//!   placeholders stay verbatim
//! - **Backend**: an unmatched request is sent to a local completion backend
//!   when one answers its probe
//! - **Stand-in**: otherwise a clearly labelled placeholder playbook with the
//!   same shape is produced, so validation and persistence still run
//!
//! Every body passes through the same post-processing: fences stripped, a
//! leading `---` guaranteed, and at most one repair pass when the text does
//! not parse. The outcome is reported as a [`RepairOutcome`].

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod backend;
pub mod error;
pub mod postprocess;
pub mod selector;
pub mod standin;
pub mod template;

pub use backend::{build_prompt, GenerationBackend, OllamaBackend, OllamaSettings, SamplingOptions};
pub use error::GenerateError;
pub use postprocess::{normalize, Normalized, RepairOutcome};
pub use selector::{BodySource, GeneratedArtifact, StrategySelector};
pub use standin::stand_in_playbook;
pub use template::TemplateSource;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
