//! Playforge Intent Resolver
//!
//! Classifies a short free-text request into one of a closed set of
//! infrastructure intents and extracts the typed parameters each intent needs.
//!
//! # Resolution
//!
//! - Input is lower-cased and trimmed
//! - An operating-system keyword is detected by substring search (default `all`)
//! - Intents are tried in declaration order, and within an intent its patterns
//!   are tried in declaration order; the first pattern that matches wins
//! - No match yields [`Intent::Unknown`] with [`Confidence::None`], routing
//!   generation to the fallback path
//!
//! # Example
//!
//! ```rust
//! use playforge_intent::{Confidence, IntentKind, IntentResolver};
//!
//! let resolution = IntentResolver::new().resolve("Install nginx on Ubuntu");
//!
//! assert_eq!(resolution.kind(), IntentKind::InstallPackage);
//! assert_eq!(resolution.confidence, Confidence::High);
//! assert_eq!(resolution.os_type, "ubuntu");
//! assert_eq!(resolution.parameters().get("package_name"), Some("nginx"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod intent;
pub mod params;
mod patterns;
pub mod resolver;

pub use intent::{Intent, IntentKind, UnknownIntentKind};
pub use params::{ParameterSet, DEFAULT_TARGET, META_KEYS, OS_TYPE_KEY, TARGET_HOSTS_KEY};
pub use resolver::{Confidence, GenerationRoute, IntentResolver, Resolution};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
