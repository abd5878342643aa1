//! Content plan document
//!
//! A [`ContentPlan`] is produced fresh for every generation attempt. Identity
//! fields (`primary_username`, `platform`, `competitors`) are stamped from the
//! [`AccountContext`] and never read back from model output.
//!
//! The four `next_post_prediction` fields (`caption`, `hashtags`,
//! `image_prompt`, `call_to_action`) are read verbatim by downstream stages
//! and keep their names.

use crate::account::{AccountContext, AccountType, Platform};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(b: &bool) -> bool {
    !*b
}

/// Predicted next post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NextPostPrediction {
    /// Main post text (`tweet_text` on Twitter)
    #[serde(alias = "tweet_text")]
    pub caption: String,
    pub hashtags: Vec<String>,
    pub image_prompt: String,
    pub call_to_action: String,
    /// Stand-in substituted after a generation failure
    #[serde(default, skip_serializing_if = "is_false")]
    #[schemars(skip)]
    pub placeholder: bool,
}

impl NextPostPrediction {
    /// Minimal stand-in used when generation fails
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            caption: String::new(),
            hashtags: Vec::new(),
            image_prompt: String::new(),
            call_to_action: String::new(),
            placeholder: true,
        }
    }
}

/// Improvement recommendations for the primary account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImprovementRecommendations {
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    #[schemars(skip)]
    pub placeholder: bool,
}

impl ImprovementRecommendations {
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            recommendations: Vec::new(),
            placeholder: true,
        }
    }
}

/// Analysis of one competitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompetitorAnalysis {
    pub overview: String,
    pub strengths: Vec<String>,
    pub vulnerabilities: Vec<String>,
    #[serde(default)]
    pub counter_strategies: Vec<String>,
    /// Mean engagement of the resolved posts, stamped by the assembler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub average_engagement: Option<f64>,
    /// Storage path the competitor's posts came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub data_source: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    #[schemars(skip)]
    pub placeholder: bool,
}

impl CompetitorAnalysis {
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            overview: String::new(),
            strengths: Vec::new(),
            vulnerabilities: Vec::new(),
            counter_strategies: Vec::new(),
            average_engagement: None,
            data_source: None,
            placeholder: true,
        }
    }
}

/// Cross-competitor intelligence summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompetitiveIntelligence {
    pub summary: String,
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub threats: Vec<String>,
}

impl CompetitiveIntelligence {
    /// No summary and no opportunities
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.summary.trim().is_empty() && self.opportunities.is_empty()
    }
}

/// Top-level recommendation section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Recommendation {
    pub competitive_intelligence: CompetitiveIntelligence,
    #[serde(default, skip_serializing_if = "is_false")]
    #[schemars(skip)]
    pub placeholder: bool,
}

impl Recommendation {
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            competitive_intelligence: CompetitiveIntelligence::default(),
            placeholder: true,
        }
    }
}

/// What data a plan was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataBasis {
    #[default]
    PrimaryAndCompetitors,
    CompetitorsOnly,
}

/// Final status written with a persisted plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Verified,
    Failed,
}

/// Validation envelope attached at export time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub overall_status: OverallStatus,
    pub issues: Vec<String>,
    pub attempts_used: u32,
}

/// Assembled content plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPlan {
    pub primary_username: String,
    pub platform: Platform,
    pub competitors: Vec<String>,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posting_style: Option<String>,
    #[serde(default)]
    pub data_basis: DataBasis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default)]
    pub next_post_prediction: Option<NextPostPrediction>,
    #[serde(default)]
    pub improvement_recommendations: Option<ImprovementRecommendations>,
    #[serde(default)]
    pub competitor_analysis: IndexMap<String, CompetitorAnalysis>,
    #[serde(default)]
    pub recommendation: Option<Recommendation>,
    #[serde(default)]
    pub attempt: u32,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationSummary>,
}

impl ContentPlan {
    /// Empty plan with identity fields stamped from `context`
    #[must_use]
    pub fn for_context(context: &AccountContext, account_type: AccountType, attempt: u32) -> Self {
        Self {
            primary_username: context.primary_username.clone(),
            platform: context.platform,
            competitors: context.competitors.clone(),
            account_type,
            posting_style: context.posting_style.clone(),
            data_basis: DataBasis::PrimaryAndCompetitors,
            warning: None,
            next_post_prediction: None,
            improvement_recommendations: None,
            competitor_analysis: IndexMap::new(),
            recommendation: None,
            attempt,
            generated_at: Utc::now(),
            validation: None,
        }
    }

    /// Mark as built without primary data
    #[must_use]
    pub fn competitors_only(mut self, warning: impl Into<String>) -> Self {
        self.data_basis = DataBasis::CompetitorsOnly;
        self.warning = Some(warning.into());
        self
    }

    /// Names of modules that hold generation stand-ins
    #[must_use]
    pub fn placeholder_modules(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.next_post_prediction.as_ref().is_some_and(|m| m.placeholder) {
            out.push("next_post_prediction".to_string());
        }
        if self
            .improvement_recommendations
            .as_ref()
            .is_some_and(|m| m.placeholder)
        {
            out.push("improvement_recommendations".to_string());
        }
        for (name, analysis) in &self.competitor_analysis {
            if analysis.placeholder {
                out.push(format!("competitor_analysis.{name}"));
            }
        }
        if self.recommendation.as_ref().is_some_and(|m| m.placeholder) {
            out.push("recommendation".to_string());
        }
        out
    }

    /// Attach the validation envelope
    #[must_use]
    pub fn with_validation(mut self, summary: ValidationSummary) -> Self {
        self.validation = Some(summary);
        self
    }
}
