//! Pipeline entry points
//!
//! `run_pipeline(context)`:
//! 1. load primary posts and resolve competitors (concurrently)
//! 2. route through the zero-data fallback; skip-export writes nothing
//! 3. settle account type and posting style (caller values win)
//! 4. index primary, then competitor posts, before any query
//! 5. assemble/audit under the retry controller with a fresh request cache
//! 6. export the plan with its validation envelope
//!
//! `process(username)` loads the stored account info document first.

use crate::assembler::{AssemblyInput, PlanAssembler};
use crate::cache::RequestCache;
use crate::classifier::{AccountClassifier, KeywordClassifier};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::fallback::{DataRoute, ZeroDataFallback};
use crate::generation::Generator;
use crate::retry::{RetryController, RunOutcome};
use crate::trends::{PercentileTrendAnalyzer, TrendAnalyzer};
use cpg_audit::QualityAuditor;
use cpg_model::{
    AccountContext, AccountType, CompetitorResolution, ContentPlan, DataBasis, OverallStatus,
    Platform, ProfileSnapshot, ValidationReport, ValidationSummary,
};
use cpg_retrieval::{InMemoryIndex, RetrievalIndex};
use cpg_storage::{layout, BlobStore, CompetitorResolver, PrimaryData};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Caller-facing result of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub run_id: Uuid,
    pub primary_username: String,
    pub success: bool,
    /// No data anywhere; nothing was persisted
    pub skip_export: bool,
    /// Terminal issues (empty on success)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
    pub attempts_used: u32,
    /// Where the plan was written, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_basis: Option<DataBasis>,
    /// Every attempt's report, in order
    pub reports: Vec<ValidationReport>,
    #[serde(skip)]
    pub plan: Option<ContentPlan>,
}

impl PipelineOutcome {
    fn skipped(run_id: Uuid, primary: &str) -> Self {
        Self {
            run_id,
            primary_username: primary.to_string(),
            success: false,
            skip_export: true,
            issues: vec![format!("no data available for {primary} or any competitor")],
            attempts_used: 0,
            plan_path: None,
            data_basis: None,
            reports: Vec::new(),
            plan: None,
        }
    }

    /// Validation failed after the whole retry budget
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        !self.success && !self.skip_export
    }
}

/// Stored caller account info, `AccountInfo/{username}/info.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    #[serde(default)]
    pub username: String,
    #[serde(default, alias = "account_type")]
    pub account_type: Option<String>,
    #[serde(default, alias = "posting_style")]
    pub posting_style: Option<String>,
    #[serde(default)]
    pub competitors: Vec<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl AccountInfo {
    /// Convert to an account context; blank fields count as absent
    ///
    /// # Errors
    /// `PipelineError::InvalidAccountInfo` for an unknown platform or
    /// account type.
    pub fn into_context(self, fallback_username: &str) -> Result<AccountContext> {
        let username = if self.username.trim().is_empty() {
            fallback_username.to_string()
        } else {
            self.username
        };
        let invalid = |reason: String| PipelineError::InvalidAccountInfo {
            username: username.clone(),
            reason,
        };

        let platform = match non_blank(self.platform) {
            Some(p) => p.parse::<Platform>().map_err(|e| invalid(e.to_string()))?,
            None => Platform::Instagram,
        };

        let mut context = AccountContext::new(&username, platform)
            .with_competitors(self.competitors.iter().filter(|c| !c.trim().is_empty()))
            .with_topics(self.topics);
        if let Some(kind) = non_blank(self.account_type) {
            context = context
                .with_account_type(kind.parse::<AccountType>().map_err(|e| invalid(e.to_string()))?);
        }
        if let Some(style) = non_blank(self.posting_style) {
            context = context.with_posting_style(style);
        }
        Ok(context)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Content-plan generation pipeline
#[derive(Clone)]
pub struct ContentPlanPipeline {
    config: Arc<PipelineConfig>,
    store: Arc<dyn BlobStore>,
    generator: Arc<dyn Generator>,
    index: Arc<dyn RetrievalIndex>,
    classifier: Arc<dyn AccountClassifier>,
    trends: Arc<dyn TrendAnalyzer>,
    fallback: ZeroDataFallback,
}

impl std::fmt::Debug for ContentPlanPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentPlanPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ContentPlanPipeline {
    /// Pipeline with the in-memory index and keyword classifier
    #[must_use]
    pub fn new(
        config: PipelineConfig,
        store: Arc<dyn BlobStore>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let classifier = KeywordClassifier::new(config.classifier.clone());
        let trends = PercentileTrendAnalyzer::new(config.trend_percentile);
        Self {
            config: Arc::new(config),
            store,
            generator,
            index: Arc::new(InMemoryIndex::default()),
            classifier: Arc::new(classifier),
            trends: Arc::new(trends),
            fallback: ZeroDataFallback::new(),
        }
    }

    /// With a shared retrieval index
    #[must_use]
    pub fn with_index(mut self, index: Arc<dyn RetrievalIndex>) -> Self {
        self.index = index;
        self
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn AccountClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    #[must_use]
    pub fn with_trend_analyzer(mut self, trends: Arc<dyn TrendAnalyzer>) -> Self {
        self.trends = trends;
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load `AccountInfo/{username}/info.json` and run the pipeline
    ///
    /// # Errors
    /// - `PipelineError::AccountInfoMissing` if no info document exists
    /// - `PipelineError::InvalidAccountInfo` if it cannot be interpreted
    /// - `PipelineError::Storage` if it cannot be read
    /// - anything [`Self::run_pipeline`] returns
    pub async fn process(&self, username: &str) -> Result<PipelineOutcome> {
        let username = cpg_model::clean_username(username);
        let path = layout::account_info_path(&username);
        let raw = self
            .store
            .get_json(&path)
            .await?
            .ok_or_else(|| PipelineError::AccountInfoMissing(username.clone()))?;

        let info: AccountInfo =
            serde_json::from_value(raw).map_err(|e| PipelineError::InvalidAccountInfo {
                username: username.clone(),
                reason: e.to_string(),
            })?;
        debug!(username = %username, path = %path, "account info loaded");

        self.run_pipeline(info.into_context(&username)?).await
    }

    /// Process several accounts in order; one failure never stops the batch
    pub async fn process_many(&self, usernames: &[String]) -> Vec<(String, Result<PipelineOutcome>)> {
        let mut results = Vec::with_capacity(usernames.len());
        for username in usernames {
            let outcome = self.process(username).await;
            if let Err(error) = &outcome {
                warn!(username = %username, %error, "account failed");
            }
            results.push((username.clone(), outcome));
        }
        results
    }

    /// Run the full pipeline for one account context
    ///
    /// # Errors
    /// `PipelineError::InvalidContext` if the context fails validation.
    /// Everything after validation degrades into the returned outcome.
    pub async fn run_pipeline(&self, context: AccountContext) -> Result<PipelineOutcome> {
        context.validate()?;
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "content_plan",
            %run_id,
            username = %context.primary_username,
            platform = %context.platform,
        );
        self.run_inner(run_id, context).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, context: AccountContext) -> Result<PipelineOutcome> {
        let resolver = CompetitorResolver::new(Arc::clone(&self.store))
            .with_lookup_timeout(self.config.competitor_lookup_timeout());
        let (primary, resolution) = tokio::join!(
            resolver.load_primary(&context.primary_username, context.platform),
            resolver.resolve(&context.primary_username, &context.competitors, context.platform),
        );

        let route = self.fallback.handle(&context, &primary, &resolution);
        let Some(data_basis) = route.data_basis() else {
            return Ok(PipelineOutcome::skipped(run_id, &context.primary_username));
        };

        let (context, account_type) = self.settle_context(context, &primary);
        self.index_posts(&context, &primary, &resolution).await;

        let cache = RequestCache::new(self.config.cache_capacity, self.config.cache_ttl());
        let assembler = PlanAssembler::new(
            Arc::clone(&self.index),
            Arc::clone(&self.generator),
            Arc::clone(&self.trends),
            cache.clone(),
            Arc::clone(&self.config),
        );
        let controller = RetryController::new(
            QualityAuditor::new(self.config.audit.clone()),
            cache,
            self.config.max_retries,
        );

        let assembler = &assembler;
        let settled = &context;
        let primary_posts = primary.posts.as_slice();
        let resolution = &resolution;
        let outcome = controller
            .run(settled, move |request| async move {
                let input = AssemblyInput {
                    context: settled,
                    account_type,
                    primary_posts,
                    resolution,
                    data_basis,
                    attempt: request.attempt,
                    feedback: request.feedback.as_ref(),
                };
                Ok(assembler.assemble(&input).await)
            })
            .await;

        Ok(self.export(run_id, &context, account_type, route, outcome).await)
    }

    /// Fill account type and posting style only where the caller left them out
    fn settle_context(
        &self,
        mut context: AccountContext,
        primary: &PrimaryData,
    ) -> (AccountContext, AccountType) {
        let account_type = context.account_type_or_else(|| {
            let profile = primary
                .profile
                .clone()
                .unwrap_or_else(|| ProfileSnapshot::bare(&context.primary_username));
            let detected = self.classifier.classify(&profile, &primary.posts);
            info!(account_type = %detected, "account type detected");
            detected
        });
        context.account_type = Some(account_type);
        if context.posting_style.is_none() {
            context.posting_style = Some(self.config.posting_style_for(account_type));
        }
        (context, account_type)
    }

    /// Index primary posts, then each found competitor; failures only reduce context
    async fn index_posts(
        &self,
        context: &AccountContext,
        primary: &PrimaryData,
        resolution: &CompetitorResolution,
    ) {
        if primary.has_posts() {
            match self
                .index
                .index(&primary.posts, &context.primary_username, false)
                .await
            {
                Ok(count) => debug!(count, "primary posts indexed"),
                Err(error) => warn!(%error, "indexing primary posts failed"),
            }
        }

        for (competitor, resolved) in resolution.iter().filter(|(_, r)| r.found) {
            match self.index.index(&resolved.posts, competitor, true).await {
                Ok(count) => debug!(competitor = %competitor, count, "competitor posts indexed"),
                Err(error) => warn!(competitor = %competitor, %error, "indexing competitor posts failed"),
            }
        }
    }

    async fn export(
        &self,
        run_id: Uuid,
        context: &AccountContext,
        account_type: AccountType,
        route: DataRoute,
        outcome: RunOutcome,
    ) -> PipelineOutcome {
        let (plan, summary, reports) = match outcome {
            RunOutcome::Verified {
                plan,
                attempts_used,
                reports,
            } => (
                plan,
                ValidationSummary {
                    overall_status: OverallStatus::Verified,
                    issues: Vec::new(),
                    attempts_used,
                },
                reports,
            ),
            RunOutcome::Exhausted {
                plan,
                issues,
                attempts_used,
                reports,
            } => {
                let plan = plan.unwrap_or_else(|| {
                    let bare = ContentPlan::for_context(context, account_type, attempts_used);
                    if route == DataRoute::CompetitorsOnly {
                        bare.competitors_only(PlanAssembler::competitors_only_warning(
                            &context.primary_username,
                        ))
                    } else {
                        bare
                    }
                });
                (
                    plan,
                    ValidationSummary {
                        overall_status: OverallStatus::Failed,
                        issues,
                        attempts_used,
                    },
                    reports,
                )
            }
        };

        let success = summary.overall_status == OverallStatus::Verified;
        let issues = summary.issues.clone();
        let attempts_used = summary.attempts_used;
        let data_basis = Some(plan.data_basis);
        let plan = plan.with_validation(summary);
        let plan_path = self.persist(context, &plan).await;

        if success {
            info!(attempts_used, plan_path = plan_path.as_deref().unwrap_or_default(), "content plan verified");
        } else {
            warn!(attempts_used, issues = issues.len(), "content plan failed validation");
        }

        PipelineOutcome {
            run_id,
            primary_username: context.primary_username.clone(),
            success,
            skip_export: false,
            issues,
            attempts_used,
            plan_path,
            data_basis,
            reports,
            plan: Some(plan),
        }
    }

    async fn persist(&self, context: &AccountContext, plan: &ContentPlan) -> Option<String> {
        let path = layout::content_plan_path(context.platform, &context.primary_username);
        let value = match serde_json::to_value(plan) {
            Ok(value) => value,
            Err(error) => {
                warn!(%error, "content plan could not be serialized");
                return None;
            }
        };
        match self.store.put_json(&path, &value).await {
            Ok(true) => Some(path),
            Ok(false) => {
                warn!(path = %path, "content plan write was rejected");
                None
            }
            Err(error) => {
                warn!(path = %path, %error, "content plan write failed");
                None
            }
        }
    }
}
