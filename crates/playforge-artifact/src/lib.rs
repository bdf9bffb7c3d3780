//! Playforge Artifact System
//!
//! Generated playbooks, how they are named on disk, and how previously
//! generated ones are found again.
//!
//! # Core Concepts
//!
//! - [`Playbook`]: typed playbook document (plays, tasks, action modules)
//! - [`ArtifactName`]: `<intent>_<os_type>_<YYYYMMDD_HHMMSS>.yml` naming convention
//! - [`ArtifactStore`]: the output directory; writes new artifacts, never edits old ones
//! - [`CandidateArtifact`]: a stored artifact scored against a request
//! - [`ReusePolicy`]: the score threshold at which an existing artifact is reused
//!
//! # Example
//!
//! ```rust,ignore
//! use playforge_artifact::{ArtifactStore, ReusePolicy};
//!
//! let store = ArtifactStore::new("output");
//! let candidates = store.find_candidates(resolution.kind(), &resolution.parameters()).await?;
//!
//! if let Some(best) = ReusePolicy::default().select(&candidates) {
//!     println!("reusing {}", best.file_name);
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod matcher;
pub mod name;
pub mod playbook;
pub mod store;

pub use error::{PlaybookError, StoreError, TaskSchemaError};
pub use matcher::{score_document, CandidateArtifact, ReusePolicy, DEFAULT_REUSE_THRESHOLD};
pub use name::{ArtifactName, TIMESTAMP_FORMAT};
pub use playbook::{is_task_keyword, Hosts, Play, Playbook, Task, TaskAction, TASK_KEYWORDS};
pub use store::ArtifactStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
