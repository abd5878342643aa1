//! Plan assembler
//!
//! Builds one [`ContentPlan`] per attempt:
//! 1. derive the topic query (caller topics, trends, platform default)
//! 2. sample the combined primary + competitor corpus
//! 3. per module, retrieve context and call the generator with that module's schema
//! 4. merge module outputs, stamping identity fields from the account context
//!
//! A module whose generation fails, times out, or returns output that does
//! not fit its schema is replaced by a flagged placeholder; assembly itself
//! never fails.

use crate::cache::RequestCache;
use crate::config::PipelineConfig;
use crate::error::GenerationError;
use crate::generation::{Generator, ModuleKey};
use crate::query::{derive_topic_query, TopicQuery};
use crate::retry::AttemptFeedback;
use crate::trends::TrendAnalyzer;
use cpg_model::{
    AccountContext, AccountType, CompetitorAnalysis, CompetitorResolution, ContentPlan, DataBasis,
    ImprovementRecommendations, NextPostPrediction, Post, Recommendation,
};
use cpg_retrieval::{QueryFilter, RetrievalIndex, RetrievedDocument};
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// A plan section the generator can fill
pub trait PlanModule: DeserializeOwned + Send {
    /// Flagged stand-in used when generation fails
    fn placeholder() -> Self;
}

impl PlanModule for NextPostPrediction {
    fn placeholder() -> Self {
        NextPostPrediction::placeholder()
    }
}

impl PlanModule for ImprovementRecommendations {
    fn placeholder() -> Self {
        ImprovementRecommendations::placeholder()
    }
}

impl PlanModule for CompetitorAnalysis {
    fn placeholder() -> Self {
        CompetitorAnalysis::placeholder()
    }
}

impl PlanModule for Recommendation {
    fn placeholder() -> Self {
        Recommendation::placeholder()
    }
}

/// Everything one assembly needs
#[derive(Debug, Clone, Copy)]
pub struct AssemblyInput<'a> {
    /// Context with account type and posting style already settled
    pub context: &'a AccountContext,
    pub account_type: AccountType,
    pub primary_posts: &'a [Post],
    pub resolution: &'a CompetitorResolution,
    pub data_basis: DataBasis,
    pub attempt: u32,
    /// Issues of the previous attempt
    pub feedback: Option<&'a AttemptFeedback>,
}

/// Combines retrieval and generation into a content plan
#[derive(Clone)]
pub struct PlanAssembler {
    index: Arc<dyn RetrievalIndex>,
    generator: Arc<dyn Generator>,
    trends: Arc<dyn TrendAnalyzer>,
    cache: RequestCache,
    config: Arc<PipelineConfig>,
}

impl std::fmt::Debug for PlanAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanAssembler")
            .field("cache", &self.cache.stats())
            .finish_non_exhaustive()
    }
}

impl PlanAssembler {
    #[must_use]
    pub fn new(
        index: Arc<dyn RetrievalIndex>,
        generator: Arc<dyn Generator>,
        trends: Arc<dyn TrendAnalyzer>,
        cache: RequestCache,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            index,
            generator,
            trends,
            cache,
            config,
        }
    }

    /// Warning attached to plans built without primary data
    #[must_use]
    pub fn competitors_only_warning(primary: &str) -> String {
        format!("No posts available for {primary}; plan derived from competitor data only")
    }

    /// Assemble a fresh plan for one attempt
    pub async fn assemble(&self, input: &AssemblyInput<'_>) -> ContentPlan {
        let context = input.context;
        let mut plan = ContentPlan::for_context(context, input.account_type, input.attempt);
        if input.data_basis == DataBasis::CompetitorsOnly {
            plan = plan.competitors_only(Self::competitors_only_warning(&context.primary_username));
        }

        let topic = match derive_topic_query(
            context,
            input.primary_posts,
            self.trends.as_ref(),
            self.config.trend_top_n,
            self.config.default_queries.for_platform(context.platform),
        ) {
            Ok(topic) => Some(topic),
            Err(error) => {
                warn!(%error, "no usable topic query; retrieval skipped");
                None
            }
        };

        let base = self.base_context(input, &plan, topic.as_ref());
        let own_filter = match input.data_basis {
            DataBasis::PrimaryAndCompetitors => QueryFilter::own(&context.primary_username),
            DataBasis::CompetitorsOnly => QueryFilter {
                username: None,
                is_competitor: Some(true),
            },
        };

        let competitor_modules = join_all(
            context
                .competitors
                .iter()
                .map(|name| self.competitor_module(name, input.resolution, &base, topic.as_ref())),
        );

        let any_filter = QueryFilter::any();
        let (next_post, improvements, recommendation, analyses) = tokio::join!(
            self.module::<NextPostPrediction>(ModuleKey::NextPost, &base, topic.as_ref(), &own_filter, None),
            self.module::<ImprovementRecommendations>(
                ModuleKey::Improvements,
                &base,
                topic.as_ref(),
                &own_filter,
                None
            ),
            self.module::<Recommendation>(
                ModuleKey::Recommendation,
                &base,
                topic.as_ref(),
                &any_filter,
                None
            ),
            competitor_modules,
        );

        plan.next_post_prediction = Some(next_post);
        plan.improvement_recommendations = Some(improvements);
        plan.recommendation = Some(recommendation);
        plan.competitor_analysis = context.competitors.iter().cloned().zip(analyses).collect();

        debug!(
            attempt = input.attempt,
            placeholders = plan.placeholder_modules().len(),
            "plan assembled"
        );
        plan
    }

    async fn competitor_module(
        &self,
        name: &str,
        resolution: &CompetitorResolution,
        base: &Map<String, Value>,
        topic: Option<&TopicQuery>,
    ) -> CompetitorAnalysis {
        let resolved = resolution.get(name);
        let stats = json!({
            "username": name,
            "found": resolved.is_some_and(|r| r.found),
            "post_count": resolved.map_or(0, |r| r.posts.len()),
            "average_engagement": resolved.and_then(cpg_model::ResolvedCompetitor::average_engagement),
        });

        let mut analysis: CompetitorAnalysis = self
            .module(
                ModuleKey::CompetitorAnalysis(name.to_string()),
                base,
                topic,
                &QueryFilter::competitor(name),
                Some(("competitor", stats)),
            )
            .await;

        if let Some(resolved) = resolved {
            analysis.average_engagement = resolved.average_engagement();
            analysis.data_source.clone_from(&resolved.source_path);
        }
        analysis
    }

    async fn module<T: PlanModule>(
        &self,
        key: ModuleKey,
        base: &Map<String, Value>,
        topic: Option<&TopicQuery>,
        filter: &QueryFilter,
        extra: Option<(&str, Value)>,
    ) -> T {
        let retrieved = match topic {
            Some(topic) => self.retrieve(topic, filter).await,
            None => Vec::new(),
        };

        let mut prompt = base.clone();
        prompt.insert("module".into(), json!(key.to_string()));
        prompt.insert("retrieved_posts".into(), snippets(&retrieved));
        if let Some((field, value)) = extra {
            prompt.insert(field.into(), value);
        }
        let prompt = Value::Object(prompt);

        match self.generate(&key, &prompt).await.and_then(|v| parse_module(&key, v)) {
            Ok(module) => module,
            Err(error) => {
                warn!(module = %key, %error, "module generation failed; using placeholder");
                T::placeholder()
            }
        }
    }

    async fn retrieve(&self, topic: &TopicQuery, filter: &QueryFilter) -> Vec<RetrievedDocument> {
        let n = self.config.n_results;
        let key = RequestCache::retrieval_key(&topic.text, n, filter);
        if let Some(hit) = self.cache.get_retrieval(&key).await {
            return hit.as_ref().clone();
        }

        match self.index.query(&topic.text, n, filter).await {
            Ok(docs) => {
                self.cache.insert_retrieval(key, docs.clone()).await;
                docs
            }
            Err(error) => {
                warn!(%error, ?filter, "retrieval failed; continuing without context");
                Vec::new()
            }
        }
    }

    async fn generate(&self, key: &ModuleKey, prompt: &Value) -> Result<Value, GenerationError> {
        let cache_key = RequestCache::generation_key(&key.to_string(), prompt);
        if let Some(hit) = self.cache.get_generation(&cache_key).await {
            debug!(module = %key, "generation cache hit");
            return Ok(hit.as_ref().clone());
        }

        let timeout = self.config.generation_timeout();
        let schema = key.output_schema();
        let value = tokio::time::timeout(timeout, self.generator.generate(key, prompt, &schema))
            .await
            .map_err(|_| GenerationError::Timeout(timeout))??;

        self.cache.insert_generation(cache_key, value.clone()).await;
        Ok(value)
    }

    fn base_context(
        &self,
        input: &AssemblyInput<'_>,
        plan: &ContentPlan,
        topic: Option<&TopicQuery>,
    ) -> Map<String, Value> {
        let context = input.context;
        let mut base = Map::new();
        base.insert("platform".into(), json!(context.platform));
        base.insert("text_field".into(), json!(context.platform.text_field()));
        base.insert("primary_username".into(), json!(context.primary_username));
        base.insert("competitors".into(), json!(context.competitors));
        base.insert("account_type".into(), json!(input.account_type));
        base.insert("posting_style".into(), json!(context.posting_style));
        base.insert("data_basis".into(), json!(input.data_basis));
        if let Some(warning) = &plan.warning {
            base.insert("warning".into(), json!(warning));
        }
        base.insert(
            "topics".into(),
            json!(topic.map(|t| t.topics.clone()).unwrap_or_default()),
        );
        base.insert("attempt".into(), json!(input.attempt));
        base.insert("corpus".into(), self.corpus_sample(input));
        if let Some(feedback) = input.feedback {
            base.insert("correction_feedback".into(), json!(feedback));
        }
        base
    }

    /// Highest-engagement posts of the combined primary + competitor corpus
    fn corpus_sample(&self, input: &AssemblyInput<'_>) -> Value {
        let mut corpus: Vec<&Post> = input
            .primary_posts
            .iter()
            .chain(input.resolution.all_posts())
            .collect();
        corpus.sort_by(|a, b| b.engagement().cmp(&a.engagement()).then_with(|| a.id().cmp(b.id())));
        corpus.truncate(self.config.corpus_sample_size);

        Value::Array(
            corpus
                .into_iter()
                .map(|p| {
                    json!({
                        "username": p.username(),
                        "is_competitor": p.is_competitor(),
                        "text": p.text(),
                        "engagement": p.engagement(),
                        "hashtags": p.hashtags(),
                    })
                })
                .collect(),
        )
    }
}

fn snippets(docs: &[RetrievedDocument]) -> Value {
    Value::Array(
        docs.iter()
            .map(|d| {
                json!({
                    "text": d.document,
                    "username": d.metadata.username,
                    "engagement": d.metadata.engagement,
                    "hashtags": d.metadata.hashtags,
                })
            })
            .collect(),
    )
}

/// Parse generator output, accepting a `{section: {...}}` wrapper
fn parse_module<T: DeserializeOwned>(key: &ModuleKey, value: Value) -> Result<T, GenerationError> {
    let value = match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key(key.section()) => {
            map.remove(key.section()).unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(value).map_err(|e| GenerationError::SchemaMismatch {
        module: key.to_string(),
        reason: e.to_string(),
    })
}
