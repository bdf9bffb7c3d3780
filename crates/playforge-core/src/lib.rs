//! Playforge Core
//!
//! Wires the intent resolver, artifact store, generation selector and sync
//! manager into one request pipeline.
//!
//! - [`AgentConfig`]: the YAML configuration document
//! - [`PlaybookValidator`]: external syntax checking
//! - [`Pipeline`]: resolve, reuse or generate, store, validate, commit
//! - [`recent_log_lines`]: tail of the log file

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod logs;
pub mod pipeline;
pub mod validate;

pub use config::{
    AgentConfig, ConfigError, HybridMode, LogFormat, LoggingSettings, MatcherSettings,
    ValidatorSettings, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILE,
};
pub use error::PipelineError;
pub use logs::recent_log_lines;
pub use pipeline::{
    GenerationReport, MatchReport, Pipeline, PipelineOptions, PipelineParts, PipelineReport,
    ReuseReport,
};
pub use validate::{
    check_schema, AnsibleSyntaxCheck, PlaybookValidator, SchemaOnly, ValidationReport,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
