//! Zero-data fallback
//!
//! Decides what data a plan can be built from before assembly starts:
//! 1. primary has posts: bypassed, normal assembly
//! 2. no primary posts but some competitor resolved: competitor-only plan
//! 3. nothing anywhere: skip export, nothing is persisted

use cpg_model::{AccountContext, CompetitorResolution, DataBasis};
use cpg_storage::PrimaryData;
use tracing::{info, warn};

/// Routing decision for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataRoute {
    /// Primary data present
    Primary,
    /// Build from competitor context only
    CompetitorsOnly,
    /// No data for any account in the request
    SkipExport,
}

impl DataRoute {
    /// Data basis a plan built on this route carries
    #[must_use]
    pub fn data_basis(&self) -> Option<DataBasis> {
        match self {
            Self::Primary => Some(DataBasis::PrimaryAndCompetitors),
            Self::CompetitorsOnly => Some(DataBasis::CompetitorsOnly),
            Self::SkipExport => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::SkipExport)
    }
}

/// Routes requests whose primary account has no data
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroDataFallback;

impl ZeroDataFallback {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Pick the route for `context` given what was resolved
    #[must_use]
    pub fn handle(
        &self,
        context: &AccountContext,
        primary: &PrimaryData,
        resolution: &CompetitorResolution,
    ) -> DataRoute {
        if primary.has_posts() {
            return DataRoute::Primary;
        }

        if resolution.any_found() {
            info!(
                username = %context.primary_username,
                platform = %context.platform,
                competitors_found = resolution.found_count(),
                competitors = context.competitors.len(),
                "no primary posts; building competitor-only plan"
            );
            return DataRoute::CompetitorsOnly;
        }

        warn!(
            username = %context.primary_username,
            platform = %context.platform,
            competitors = context.competitors.len(),
            "no data for primary or any competitor; skipping export"
        );
        DataRoute::SkipExport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpg_model::{LookupSource, Platform, Post, ResolvedCompetitor};

    fn ctx() -> AccountContext {
        AccountContext::new("newbrand", Platform::Instagram).with_competitors(["glossier", "rarebeauty"])
    }

    fn resolution(found: bool) -> CompetitorResolution {
        let glossier = if found {
            ResolvedCompetitor::found(
                vec![Post::new("g1", "glossier", "Skin first").as_competitor(true)],
                "instagram/newbrand/glossier.json",
                LookupSource::Colocated,
            )
        } else {
            ResolvedCompetitor::missing()
        };
        vec![
            ("glossier".to_string(), glossier),
            ("rarebeauty".to_string(), ResolvedCompetitor::missing()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn primary_data_bypasses_fallback() {
        let primary = PrimaryData {
            posts: vec![Post::new("p1", "newbrand", "Launch day")],
            ..PrimaryData::default()
        };
        let route = ZeroDataFallback::new().handle(&ctx(), &primary, &resolution(false));
        assert_eq!(route, DataRoute::Primary);
        assert_eq!(route.data_basis(), Some(DataBasis::PrimaryAndCompetitors));
    }

    #[test]
    fn one_competitor_is_enough() {
        let route = ZeroDataFallback::new().handle(&ctx(), &PrimaryData::default(), &resolution(true));
        assert_eq!(route, DataRoute::CompetitorsOnly);
        assert!(!route.is_skip());
    }

    #[test]
    fn no_data_anywhere_skips() {
        let route = ZeroDataFallback::new().handle(&ctx(), &PrimaryData::default(), &resolution(false));
        assert!(route.is_skip());
        assert_eq!(route.data_basis(), None);

        let alone = AccountContext::new("newbrand", Platform::Instagram);
        let route = ZeroDataFallback::new().handle(
            &alone,
            &PrimaryData::default(),
            &CompetitorResolution::default(),
        );
        assert!(route.is_skip());
    }
}
