//! CPG Core - content-plan generation pipeline
//!
//! Provides:
//! - [`ContentPlanPipeline`]: `process(username)` and `run_pipeline(context)`
//! - [`PlanAssembler`]: retrieval + generation per plan module
//! - [`RetryController`]: audit-driven, budgeted regeneration
//! - [`ZeroDataFallback`]: competitor-only and skip-export routing
//! - [`Generator`]: generative capability, with [`CommandGenerator`]
//! - [`RequestCache`]: per-invocation caches, invalidated between attempts
//! - [`PipelineConfig`]: TOML configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use cpg_core::prelude::*;
//!
//! let pipeline = ContentPlanPipeline::new(PipelineConfig::default(), store, generator);
//! let ctx = AccountContext::new("geoffreyhinton", Platform::Twitter)
//!     .with_competitors(["elonmusk", "ylecun", "sama"]);
//! let outcome = pipeline.run_pipeline(ctx).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod assembler;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod error;
pub mod fallback;
pub mod generation;
pub mod pipeline;
pub mod query;
pub mod retry;
pub mod trends;

pub use assembler::{AssemblyInput, PlanAssembler, PlanModule};
pub use cache::{CacheScope, CacheStats, RequestCache};
pub use classifier::{AccountClassifier, ClassifierConfig, KeywordClassifier};
pub use config::{DefaultQueries, PipelineConfig};
pub use error::{ConfigError, GenerationError, PipelineError, Result};
pub use fallback::{DataRoute, ZeroDataFallback};
pub use generation::{clean_response, render_prompt, CommandGenerator, Generator, ModuleKey};
pub use pipeline::{AccountInfo, ContentPlanPipeline, PipelineOutcome};
pub use query::{derive_topic_query, TopicQuery, TopicSource};
pub use retry::{AttemptFeedback, AttemptRequest, RetryController, RunOutcome};
pub use trends::{PercentileTrendAnalyzer, TrendAnalyzer};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::{
        ContentPlanPipeline, Generator, PipelineConfig, PipelineError, PipelineOutcome, Result,
    };
    pub use cpg_model::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
