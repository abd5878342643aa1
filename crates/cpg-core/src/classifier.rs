//! Account classification
//!
//! Classification only runs when the caller did not supply an account type.
//! Keyword lists are configuration; accuracy is a tuning concern, not a
//! correctness guarantee.

use cpg_model::{AccountType, Post, ProfileSnapshot};
use serde::{Deserialize, Serialize};

/// Classifies an account from its profile and posts
pub trait AccountClassifier: Send + Sync {
    fn classify(&self, profile: &ProfileSnapshot, posts: &[Post]) -> AccountType;
}

/// Keyword data for [`KeywordClassifier`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Biography / category terms that indicate a brand
    pub brand_keywords: Vec<String>,
    /// Biography terms that indicate a personal or creator account
    pub personal_keywords: Vec<String>,
    /// Handles always treated as brands
    pub known_brands: Vec<String>,
    /// Caption terms counted as business intent
    pub business_terms: Vec<String>,
    /// Hashtags counted as business intent
    pub business_hashtags: Vec<String>,
    /// Share of posts with business terms above which the account is a brand
    pub business_post_ratio: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let s = |items: &[&str]| items.iter().map(ToString::to_string).collect::<Vec<_>>();
        Self {
            brand_keywords: s(&[
                "official", "brand", "shop", "store", "company", "inc", "ltd", "cosmetics",
                "beauty", "products", "customer", "worldwide", "shipping",
            ]),
            personal_keywords: s(&[
                "personal", "my life", "professor", "researcher", "scientist", "dad", "mom",
                "author", "views are my own", "creator", "blogger",
            ]),
            known_brands: s(&[
                "fentybeauty", "maccosmetics", "toofaced", "netflix", "nike", "adidas",
                "redbull", "cocacola", "apple", "samsung",
            ]),
            business_terms: s(&["product", "sale", "brand", "shop", "buy", "launch"]),
            business_hashtags: s(&["business", "brand", "product", "sale", "shop"]),
            business_post_ratio: 0.6,
        }
    }
}

/// Keyword-scoring classifier
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    config: ClassifierConfig,
}

impl KeywordClassifier {
    #[inline]
    #[must_use]
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    fn profile_scores(&self, profile: &ProfileSnapshot) -> (usize, usize) {
        let text = format!(
            "{} {} {}",
            profile.full_name,
            profile.biography,
            profile.category.as_deref().unwrap_or_default()
        )
        .to_lowercase();
        let hits = |words: &[String]| {
            words
                .iter()
                .filter(|w| contains_word(&text, &w.to_lowercase()))
                .count()
        };
        (hits(&self.config.brand_keywords), hits(&self.config.personal_keywords))
    }

    #[allow(clippy::cast_precision_loss)]
    fn posts_look_commercial(&self, posts: &[Post]) -> bool {
        let with_terms = posts
            .iter()
            .filter(|p| {
                let text = p.text().to_lowercase();
                self.config.business_terms.iter().any(|t| text.contains(t.as_str()))
            })
            .count();
        let tag_hits = posts
            .iter()
            .flat_map(|p| p.hashtags().iter())
            .filter(|tag| self.config.business_hashtags.iter().any(|b| tag.contains(b.as_str())))
            .count();

        let n = posts.len() as f64;
        with_terms as f64 / n > self.config.business_post_ratio || tag_hits as f64 > n * 0.5
    }
}

impl AccountClassifier for KeywordClassifier {
    fn classify(&self, profile: &ProfileSnapshot, posts: &[Post]) -> AccountType {
        if profile.is_business == Some(true) {
            return AccountType::Branding;
        }
        let handle = profile.username.to_lowercase();
        if self.config.known_brands.iter().any(|b| b.eq_ignore_ascii_case(&handle)) {
            return AccountType::Branding;
        }

        let (brand, personal) = self.profile_scores(profile);
        if brand > personal {
            return AccountType::Branding;
        }
        if personal > brand {
            return AccountType::NonBranding;
        }

        if posts.is_empty() {
            return AccountType::Unknown;
        }
        if self.posts_look_commercial(posts) {
            AccountType::Branding
        } else {
            AccountType::NonBranding
        }
    }
}

fn contains_word(text: &str, word: &str) -> bool {
    if word.contains(' ') {
        return text.contains(word);
    }
    text.split(|c: char| !c.is_alphanumeric())
        .any(|token| token == word)
}
