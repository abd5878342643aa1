//! Quality auditor
//!
//! Every check runs on every audit; nothing short-circuits, so a report lists
//! all problems of an attempt at once. Order of issues:
//! 1. next-post prediction (presence, depth, hashtags, image prompt)
//! 2. improvement recommendations
//! 3. competitor analysis
//! 4. competitive-intelligence recommendation
//! 5. identity fields against the account context
//! 6. generation stand-ins

use crate::hashtags::{as_hashtag, hardcoded_patterns, is_contextual, is_hardcoded};
use crate::rules::AuditRules;
use crate::violation::{count_by_kind, Violation};
use cpg_model::{AccountContext, ContentPlan, NextPostPrediction, ValidationReport};
use std::collections::BTreeSet;
use tracing::debug;

const TEMPLATE_EXCERPT_CHARS: usize = 50;

/// Audits content plans against [`AuditRules`]
#[derive(Debug, Clone, Default)]
pub struct QualityAuditor {
    rules: AuditRules,
}

impl QualityAuditor {
    #[inline]
    #[must_use]
    pub fn new(rules: AuditRules) -> Self {
        Self { rules }
    }

    #[inline]
    #[must_use]
    pub fn rules(&self) -> &AuditRules {
        &self.rules
    }

    /// Audit a plan; the report's attempt number is the plan's
    #[must_use]
    pub fn audit(&self, plan: &ContentPlan, context: &AccountContext) -> ValidationReport {
        let violations = self.violations(plan, context);
        debug!(
            attempt = plan.attempt,
            violations = violations.len(),
            kinds = ?count_by_kind(&violations),
            "audit complete"
        );
        ValidationReport::from_issues(
            plan.attempt,
            violations.iter().map(ToString::to_string).collect(),
        )
    }

    /// All violations, in check order
    #[must_use]
    pub fn violations(&self, plan: &ContentPlan, context: &AccountContext) -> Vec<Violation> {
        let mut out = Vec::new();

        match &plan.next_post_prediction {
            Some(next_post) => self.check_next_post(next_post, context, &mut out),
            None => out.push(Violation::MissingNextPost),
        }
        self.check_improvements(plan, &mut out);
        Self::check_competitors(plan, context, &mut out);
        Self::check_recommendation(plan, &mut out);
        Self::check_identity(plan, context, &mut out);

        out.extend(
            plan.placeholder_modules()
                .into_iter()
                .map(Violation::PlaceholderModule),
        );
        out
    }

    /// Hashtag violations only
    #[must_use]
    pub fn hashtag_violations(&self, hashtags: &[String], username: &str) -> Vec<Violation> {
        if hashtags.iter().all(|t| t.trim().trim_start_matches('#').is_empty()) {
            return vec![Violation::MissingHashtags];
        }

        let patterns = hardcoded_patterns(username, &self.rules.hardcoded_suffixes);
        let mut out: Vec<Violation> = hashtags
            .iter()
            .filter(|tag| is_hardcoded(tag, &patterns))
            .map(|tag| Violation::HardcodedHashtag(tag.clone()))
            .collect();

        let contextual = hashtags
            .iter()
            .filter(|tag| is_contextual(tag, &self.rules.contextual_keywords))
            .count();
        if contextual == 0 && hashtags.len() > self.rules.contextual_min_hashtags {
            out.push(Violation::NoContextualHashtags(
                hashtags.iter().map(|t| as_hashtag(t)).collect(),
            ));
        }
        out
    }

    fn check_next_post(
        &self,
        next_post: &NextPostPrediction,
        context: &AccountContext,
        out: &mut Vec<Violation>,
    ) {
        let caption = next_post.caption.trim();
        if caption.is_empty() {
            out.push(Violation::MissingCaption);
        } else if caption.chars().count() < self.rules.min_caption_chars {
            out.push(Violation::CaptionTooShort(caption.chars().count()));
        }

        out.extend(self.hashtag_violations(&next_post.hashtags, &context.primary_username));

        let image_prompt = next_post.image_prompt.trim();
        if image_prompt.is_empty() {
            out.push(Violation::MissingImagePrompt);
        } else if image_prompt.chars().count() < self.rules.min_image_prompt_chars {
            out.push(Violation::ImagePromptTooShort);
        }
    }

    fn check_improvements(&self, plan: &ContentPlan, out: &mut Vec<Violation>) {
        let Some(improvements) = &plan.improvement_recommendations else {
            out.push(Violation::MissingImprovements);
            return;
        };

        let recs: Vec<&str> = improvements
            .recommendations
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .collect();
        if recs.len() < self.rules.min_recommendations {
            out.push(Violation::InsufficientRecommendations {
                found: recs.len(),
                required: self.rules.min_recommendations,
            });
        }

        for (i, rec) in recs.iter().enumerate() {
            if self.rules.template_phrase_in(rec).is_some() {
                out.push(Violation::TemplateRecommendation {
                    index: i + 1,
                    excerpt: rec.chars().take(TEMPLATE_EXCERPT_CHARS).collect(),
                });
            }
        }
    }

    fn check_competitors(plan: &ContentPlan, context: &AccountContext, out: &mut Vec<Violation>) {
        let analysis = &plan.competitor_analysis;
        if analysis.is_empty() {
            if !context.competitors.is_empty() {
                out.push(Violation::MissingCompetitorAnalysis);
            }
            return;
        }

        if analysis.len() != context.competitors.len() {
            out.push(Violation::CompetitorCountMismatch {
                analyzed: analysis.len(),
                expected: context.competitors.len(),
            });
        }
        for competitor in &context.competitors {
            if !analysis.contains_key(competitor) {
                out.push(Violation::MissingCompetitorEntry(competitor.clone()));
            }
        }

        for (name, entry) in analysis {
            let missing = |field: &'static str| Violation::MissingCompetitorField {
                competitor: name.clone(),
                field,
            };
            if entry.overview.trim().is_empty() {
                out.push(missing("overview"));
            }
            if entry.strengths.iter().all(|s| s.trim().is_empty()) {
                out.push(missing("strengths"));
            }
            if entry.vulnerabilities.iter().all(|s| s.trim().is_empty()) {
                out.push(missing("vulnerabilities"));
            }
        }
    }

    fn check_recommendation(plan: &ContentPlan, out: &mut Vec<Violation>) {
        match &plan.recommendation {
            None => out.push(Violation::MissingRecommendation),
            Some(rec) if rec.competitive_intelligence.is_empty() => {
                out.push(Violation::MissingCompetitiveIntelligence);
            }
            Some(_) => {}
        }
    }

    fn check_identity(plan: &ContentPlan, context: &AccountContext, out: &mut Vec<Violation>) {
        if plan.platform != context.platform {
            out.push(Violation::PlatformMismatch {
                expected: context.platform.to_string(),
                got: plan.platform.to_string(),
            });
        }
        if plan.primary_username != context.primary_username {
            out.push(Violation::UsernameMismatch {
                expected: context.primary_username.clone(),
                got: plan.primary_username.clone(),
            });
        }
        let expected: BTreeSet<&String> = context.competitors.iter().collect();
        let got: BTreeSet<&String> = plan.competitors.iter().collect();
        if expected != got {
            out.push(Violation::CompetitorMismatch {
                expected: context.competitors.clone(),
                got: plan.competitors.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpg_model::{
        AccountType, CompetitiveIntelligence, CompetitorAnalysis, ImprovementRecommendations,
        Platform, Recommendation,
    };
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn context() -> AccountContext {
        AccountContext::new("geoffreyhinton", Platform::Twitter)
            .with_competitors(["elonmusk", "ylecun", "sama"])
    }

    fn analysis() -> CompetitorAnalysis {
        CompetitorAnalysis {
            overview: "Large audience focused on product announcements".into(),
            strengths: vec!["Reach".into()],
            vulnerabilities: vec!["Low depth".into()],
            counter_strategies: vec![],
            average_engagement: None,
            data_source: None,
            placeholder: false,
        }
    }

    fn good_plan(ctx: &AccountContext) -> ContentPlan {
        let mut plan = ContentPlan::for_context(ctx, AccountType::NonBranding, 1);
        plan.next_post_prediction = Some(NextPostPrediction {
            caption: "Interpretability research is the safety work we need now".into(),
            hashtags: vec!["#AISafety".into(), "#Research".into(), "#DeepLearning".into()],
            image_prompt: "A chalkboard covered in neural network diagrams, warm light".into(),
            call_to_action: "What would you study first?".into(),
            placeholder: false,
        });
        plan.improvement_recommendations = Some(ImprovementRecommendations {
            recommendations: vec![
                "Thread one paper summary per week".into(),
                "Reply to top critics with evidence".into(),
                "Share lecture clips with captions".into(),
            ],
            placeholder: false,
        });
        for c in &ctx.competitors {
            plan.competitor_analysis.insert(c.clone(), analysis());
        }
        plan.recommendation = Some(Recommendation {
            competitive_intelligence: CompetitiveIntelligence {
                summary: "Competitors favour hype over rigour".into(),
                opportunities: vec!["Own the rigorous explainer niche".into()],
                threats: vec![],
            },
            placeholder: false,
        });
        plan
    }

    #[test]
    fn good_plan_passes() {
        let ctx = context();
        let report = QualityAuditor::default().audit(&good_plan(&ctx), &ctx);
        assert!(report.passed, "{:?}", report.issues);
        assert_eq!(report.attempt_number, 1);
    }

    #[test]
    fn hardcoded_hashtag_is_reported() {
        let ctx = context();
        let mut plan = good_plan(&ctx);
        plan.next_post_prediction.as_mut().unwrap().hashtags = vec!["#geoffreyhintonlove".into()];

        let report = QualityAuditor::default().audit(&plan, &ctx);
        assert_eq!(
            report.issues,
            vec!["NEXT_POST: HARDCODED HASHTAG DETECTED: #geoffreyhintonlove (generic pattern)"]
        );
    }

    #[test]
    fn all_checks_are_recorded_without_short_circuit() {
        let ctx = context();
        let mut plan = ContentPlan::for_context(&ctx, AccountType::Unknown, 2);
        plan.platform = Platform::Instagram;
        plan.competitors = vec!["elonmusk".into()];
        plan.improvement_recommendations = Some(ImprovementRecommendations {
            recommendations: vec!["Become the leading voice in your field today".into()],
            placeholder: false,
        });

        let issues = QualityAuditor::default().audit(&plan, &ctx).issues;
        assert_eq!(
            issues,
            vec![
                "MISSING: next_post_prediction module".to_string(),
                "INSUFFICIENT: Only 1 recommendations (need at least 3)".to_string(),
                "TEMPLATE RECOMMENDATION #1: Become the leading voice in your field today..."
                    .to_string(),
                "MISSING: competitor_analysis module".to_string(),
                "MISSING: recommendation module".to_string(),
                "PLATFORM MISMATCH: Expected twitter, got instagram".to_string(),
                "COMPETITOR MISMATCH: Expected [\"elonmusk\", \"ylecun\", \"sama\"], got [\"elonmusk\"]"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn competitor_entries_checked_individually() {
        let ctx = context();
        let mut plan = good_plan(&ctx);
        plan.competitor_analysis.shift_remove("sama");
        plan.competitor_analysis.get_mut("ylecun").unwrap().strengths.clear();

        let issues = QualityAuditor::default().audit(&plan, &ctx).issues;
        assert_eq!(
            issues,
            vec![
                "MISMATCH: 2 analyzed vs 3 competitors listed",
                "MISSING: sama analysis",
                "MISSING: ylecun strengths",
            ]
        );
    }

    #[test]
    fn short_fields_and_placeholders() {
        let ctx = context();
        let mut plan = good_plan(&ctx);
        {
            let next = plan.next_post_prediction.as_mut().unwrap();
            next.caption = "Too short".into();
            next.image_prompt = "tiny".into();
        }
        plan.recommendation = Some(Recommendation::placeholder());

        let issues = QualityAuditor::default().audit(&plan, &ctx).issues;
        assert_eq!(
            issues,
            vec![
                "POOR QUALITY: Caption too short (9 chars)",
                "POOR QUALITY: Image prompt too short",
                "MISSING: competitive_intelligence in recommendation",
                "PLACEHOLDER: recommendation was substituted after a generation failure",
            ]
        );
    }

    #[test]
    fn no_competitors_needs_no_analysis() {
        let ctx = AccountContext::new("netflix", Platform::Facebook);
        let plan = good_plan(&ctx);
        assert!(QualityAuditor::default().audit(&plan, &ctx).passed);
    }

    #[test]
    fn skincareglow_is_not_hardcoded_for_fentybeauty() {
        let auditor = QualityAuditor::default();
        let tags = vec!["#skincareglow".to_string()];
        assert!(auditor.hashtag_violations(&tags, "fentybeauty").is_empty());
    }

    proptest! {
        #[test]
        fn generic_hashtag_sets_report_only_no_contextual(
            tags in prop::collection::vec("[bcdjkpqvxz]{3,12}", 3..8)
        ) {
            let auditor = QualityAuditor::default();
            let tags: Vec<String> = tags.into_iter().map(|t| format!("#{t}")).collect();
            let violations = auditor.hashtag_violations(&tags, "fentybeauty");
            prop_assert_eq!(violations, vec![Violation::NoContextualHashtags(tags)]);
        }

        #[test]
        fn username_suffix_hashtags_are_always_flagged(
            username in "[a-z][a-z0-9_]{0,14}",
            suffix in prop::sample::select(vec!["love", "beauty", "style"]),
            upper in prop::collection::vec(any::<bool>(), 32)
        ) {
            let tag: String = format!("#{username}{suffix}")
                .chars()
                .zip(upper.iter().cycle())
                .map(|(c, &u)| if u { c.to_ascii_uppercase() } else { c })
                .collect();
            let violations = QualityAuditor::default().hashtag_violations(&[tag.clone()], &username);
            prop_assert!(violations.contains(&Violation::HardcodedHashtag(tag)));
        }

        #[test]
        fn extra_characters_break_the_exact_match(
            username in "[a-z]{3,10}",
            extra in "[a-z]{1,5}"
        ) {
            let tag = format!("#{extra}{username}love");
            let violations = QualityAuditor::default().hashtag_violations(&[tag], &username);
            prop_assert!(!violations.iter().any(|v| matches!(v, Violation::HardcodedHashtag(_))));
        }
    }
}
