//! Playforge Sync Manager
//!
//! Keeps generated playbooks in a local git repository and propagates them to
//! a remote.
//!
//! # Lifecycle
//!
//! `Uninitialized → LocalReady → RemoteConfigured` (or `Disabled` when version
//! control is turned off). Initialization is idempotent.
//!
//! # Push modes
//!
//! - `immediate`: every commit is followed by one push attempt
//! - `manual`: pushes happen only when asked
//! - `scheduled`: a [`PushScheduler`] pushes every `push_interval` seconds
//!   while commits are pending
//!
//! Every successful local commit is queued as pending. A successful push
//! clears the whole queue; a failed push leaves it untouched. Retries are
//! always the caller's decision.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod credentials;
pub mod error;
pub mod git;
pub mod manager;
pub mod scheduler;

pub use config::{PushMode, SyncConfig};
pub use credentials::Credentials;
pub use error::SyncError;
pub use git::{CliGit, GitOutput, GitRunner};
pub use manager::{
    CommitOutcome, CommitRecord, PushReport, SyncManager, SyncState, SyncStatus,
};
pub use scheduler::PushScheduler;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
