//! Pipeline configuration
//!
//! Loaded from TOML; every key is optional and falls back to its default.
//!
//! ```toml
//! max_retries = 3
//! n_results = 5
//! generation_timeout_secs = 120
//!
//! [default_queries]
//! twitter = "technology innovation research"
//!
//! [audit]
//! min_recommendations = 3
//! ```

use crate::classifier::ClassifierConfig;
use crate::error::ConfigError;
use cpg_audit::AuditRules;
use cpg_model::{AccountType, Platform};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Fallback topic queries per platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultQueries {
    pub instagram: String,
    pub twitter: String,
    pub facebook: String,
}

impl Default for DefaultQueries {
    fn default() -> Self {
        Self {
            instagram: "lifestyle beauty fashion trending visual content".into(),
            twitter: "technology innovation news trending discussion".into(),
            facebook: "community engagement entertainment news updates".into(),
        }
    }
}

impl DefaultQueries {
    #[must_use]
    pub fn for_platform(&self, platform: Platform) -> &str {
        match platform {
            Platform::Instagram => &self.instagram,
            Platform::Twitter => &self.twitter,
            Platform::Facebook => &self.facebook,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Generate/validate cycles per request (0 behaves as 1)
    pub max_retries: u32,
    /// Documents per retrieval query
    pub n_results: usize,
    /// Trend topics used for the topic query
    pub trend_top_n: usize,
    /// Engagement percentile for trend extraction
    pub trend_percentile: f64,
    /// Posts from the combined corpus offered to each module
    pub corpus_sample_size: usize,
    pub competitor_lookup_timeout_secs: u64,
    pub generation_timeout_secs: u64,
    /// Request-scoped cache entries per scope
    pub cache_capacity: u64,
    pub cache_ttl_secs: u64,
    /// Posting style used when the caller supplies none
    pub default_posting_style: String,
    pub default_queries: DefaultQueries,
    pub audit: AuditRules,
    pub classifier: ClassifierConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            n_results: 5,
            trend_top_n: 3,
            trend_percentile: 0.75,
            corpus_sample_size: 20,
            competitor_lookup_timeout_secs: 30,
            generation_timeout_secs: 120,
            cache_capacity: 1_000,
            cache_ttl_secs: 3_600,
            default_posting_style: "Professional content creation with consistent engagement"
                .into(),
            default_queries: DefaultQueries::default(),
            audit: AuditRules::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl PipelineConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML, falling back to defaults for missing keys
    ///
    /// # Errors
    /// `ConfigError::Parse` for invalid TOML, `ConfigError::Invalid` for
    /// values rejected by [`Self::validate`].
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject unusable values
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_results == 0 {
            return Err(ConfigError::Invalid("n_results must be at least 1".into()));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid("cache_capacity must be at least 1".into()));
        }
        if self.competitor_lookup_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "competitor_lookup_timeout_secs must be at least 1".into(),
            ));
        }
        if self.generation_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "generation_timeout_secs must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.trend_percentile) {
            return Err(ConfigError::Invalid(
                "trend_percentile must be within 0.0..=1.0".into(),
            ));
        }
        for platform in Platform::all() {
            if self.default_queries.for_platform(platform).trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "default query for {platform} must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// With retry budget
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// With documents per query
    #[inline]
    #[must_use]
    pub fn with_n_results(mut self, n_results: usize) -> Self {
        self.n_results = n_results;
        self
    }

    /// With generation timeout
    #[inline]
    #[must_use]
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// With audit rules
    #[inline]
    #[must_use]
    pub fn with_audit_rules(mut self, rules: AuditRules) -> Self {
        self.audit = rules;
        self
    }

    /// Attempts actually made for the configured budget
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    #[inline]
    #[must_use]
    pub fn competitor_lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.competitor_lookup_timeout_secs)
    }

    #[inline]
    #[must_use]
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    #[inline]
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Posting style to use for an account type when none was supplied
    #[must_use]
    pub fn posting_style_for(&self, account_type: AccountType) -> String {
        match account_type {
            AccountType::Branding => {
                format!("{} with product-focused brand storytelling", self.default_posting_style)
            }
            AccountType::NonBranding => {
                format!("{} with an authentic personal voice", self.default_posting_style)
            }
            AccountType::Unknown => self.default_posting_style.clone(),
        }
    }
}
