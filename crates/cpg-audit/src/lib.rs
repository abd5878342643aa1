//! CPG Audit - mechanical quality checks for content plans
//!
//! Checks, all independent and all recorded:
//! - **Presence**: every plan module exists and is non-empty
//! - **Depth**: caption, image prompt and recommendation count thresholds
//! - **Anti-template**: boilerplate recommendation phrases
//! - **Anti-hard-coding**: `#{username}love`-style hashtags
//! - **Contextual relevance**: at least one domain hashtag
//! - **Structural consistency**: identity fields and competitor coverage

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod auditor;
pub mod hashtags;
pub mod rules;
pub mod violation;

pub use auditor::QualityAuditor;
pub use rules::AuditRules;
pub use violation::{count_by_kind, Violation, ViolationKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
