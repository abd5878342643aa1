//! Storage key layout
//!
//! All key construction lives here so resolver, loader and exporter agree on
//! where documents are.

use cpg_model::{LookupSource, Platform};

/// Namespace for platform-agnostic profile data
pub const PROFILE_NAMESPACE: &str = "ProfileInfo";

/// Namespace for caller account info documents
pub const ACCOUNT_INFO_NAMESPACE: &str = "AccountInfo";

/// Namespace for exported plans
pub const CONTENT_PLAN_NAMESPACE: &str = "content_plans";

/// Storage key for one competitor under one lookup layout
#[must_use]
pub fn competitor_path(
    source: LookupSource,
    platform: Platform,
    primary: &str,
    competitor: &str,
) -> String {
    match source {
        LookupSource::Colocated => format!("{platform}/{primary}/{competitor}.json"),
        LookupSource::OwnNamespace => format!("{platform}/{competitor}/{competitor}.json"),
        LookupSource::Flat => format!("{platform}/{competitor}.json"),
        LookupSource::Profile => format!("{PROFILE_NAMESPACE}/{competitor}.json"),
    }
}

/// Lookup candidates for a competitor, in priority order
#[must_use]
pub fn competitor_candidates(
    platform: Platform,
    primary: &str,
    competitor: &str,
) -> Vec<(LookupSource, String)> {
    LookupSource::ORDER
        .iter()
        .map(|&source| (source, competitor_path(source, platform, primary, competitor)))
        .collect()
}

/// Lookup candidates for the primary account's own posts
#[must_use]
pub fn primary_candidates(platform: Platform, primary: &str) -> [String; 2] {
    [
        format!("{platform}/{primary}/{primary}.json"),
        format!("{platform}/{primary}.json"),
    ]
}

/// Caller account info document
#[must_use]
pub fn account_info_path(username: &str) -> String {
    format!("{ACCOUNT_INFO_NAMESPACE}/{username}/info.json")
}

/// Export location of a content plan
#[must_use]
pub fn content_plan_path(platform: Platform, primary: &str) -> String {
    format!("{CONTENT_PLAN_NAMESPACE}/{platform}/{primary}/content_plan.json")
}
