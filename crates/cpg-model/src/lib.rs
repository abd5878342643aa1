//! CPG Model - shared data types for content-plan generation
//!
//! Provides:
//! - [`Post`]: immutable scraped post with derived engagement
//! - [`AccountContext`]: per-invocation caller input
//! - [`CompetitorResolution`]: resolved competitor data with provenance
//! - [`ContentPlan`]: the assembled plan document
//! - [`ValidationReport`]: per-attempt audit outcome
//! - [`normalize_posts`]: tagged-variant normalizer for stored JSON shapes

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod account;
pub mod error;
pub mod normalize;
pub mod plan;
pub mod post;
pub mod report;
pub mod resolution;

pub use account::{clean_username, AccountContext, AccountType, Platform, ProfileSnapshot};
pub use error::ModelError;
pub use normalize::{extract_profile, normalize_posts, NormalizedPosts};
pub use plan::{
    CompetitiveIntelligence, CompetitorAnalysis, ContentPlan, DataBasis, ImprovementRecommendations,
    NextPostPrediction, OverallStatus, Recommendation, ValidationSummary,
};
pub use post::{engagement_series, extract_hashtags, EngagementPoint, Post};
pub use report::ValidationReport;
pub use resolution::{CompetitorResolution, LookupSource, ResolvedCompetitor};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::{
        AccountContext, AccountType, CompetitorResolution, ContentPlan, Platform, Post,
        ValidationReport,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
