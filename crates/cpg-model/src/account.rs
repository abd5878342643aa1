//! Account context types
//!
//! [`AccountContext`] is created once per pipeline invocation from caller
//! input. Explicitly supplied `account_type` and `posting_style` are
//! authoritative: classification only fills them when they are absent.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Social platform a plan targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Twitter,
    Facebook,
}

impl Platform {
    /// Storage / wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
        }
    }

    /// Name the platform uses for the main post text
    #[inline]
    #[must_use]
    pub fn text_field(&self) -> &'static str {
        match self {
            Self::Twitter => "tweet_text",
            Self::Instagram | Self::Facebook => "caption",
        }
    }

    /// All supported platforms
    #[must_use]
    pub fn all() -> [Platform; 3] {
        [Self::Instagram, Self::Twitter, Self::Facebook]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "instagram" | "ig" => Ok(Self::Instagram),
            "twitter" | "x" => Ok(Self::Twitter),
            "facebook" | "fb" => Ok(Self::Facebook),
            other => Err(ModelError::UnknownPlatform(other.to_string())),
        }
    }
}

/// Account classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccountType {
    #[serde(rename = "branding")]
    Branding,
    #[serde(rename = "non-branding")]
    NonBranding,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl AccountType {
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Branding => "branding",
            Self::NonBranding => "non-branding",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "branding" | "brand" | "business" => Ok(Self::Branding),
            "non-branding" | "nonbranding" | "personal" | "creator" => Ok(Self::NonBranding),
            "unknown" => Ok(Self::Unknown),
            other => Err(ModelError::UnknownAccountType(other.to_string())),
        }
    }
}

/// Strip whitespace and a leading `@` from a handle
#[must_use]
pub fn clean_username(raw: &str) -> String {
    raw.trim().trim_start_matches('@').trim().to_string()
}

/// Per-invocation account context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountContext {
    pub primary_username: String,
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posting_style: Option<String>,
    #[serde(default)]
    pub competitors: Vec<String>,
    /// Caller-supplied topics; preferred over trend-derived topics
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
}

impl AccountContext {
    /// Create context for a primary account
    #[must_use]
    pub fn new(primary_username: impl AsRef<str>, platform: Platform) -> Self {
        Self {
            primary_username: clean_username(primary_username.as_ref()),
            platform,
            account_type: None,
            posting_style: None,
            competitors: Vec::new(),
            topics: Vec::new(),
        }
    }

    /// With ordered competitor handles
    #[must_use]
    pub fn with_competitors<I, S>(mut self, competitors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.competitors = competitors
            .into_iter()
            .map(|c| clean_username(c.as_ref()))
            .collect();
        self
    }

    /// With explicit account type (authoritative)
    #[inline]
    #[must_use]
    pub fn with_account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = Some(account_type);
        self
    }

    /// With explicit posting style (authoritative)
    #[inline]
    #[must_use]
    pub fn with_posting_style(mut self, style: impl Into<String>) -> Self {
        self.posting_style = Some(style.into());
        self
    }

    /// With caller-supplied topics
    #[must_use]
    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    /// Account type, running `detect` only when none was supplied
    pub fn account_type_or_else(&self, detect: impl FnOnce() -> AccountType) -> AccountType {
        self.account_type.unwrap_or_else(detect)
    }

    /// Check structural sanity of caller input
    ///
    /// # Errors
    /// - `ModelError::EmptyUsername` for a blank primary or competitor handle
    /// - `ModelError::DuplicateCompetitor` if a handle repeats
    /// - `ModelError::CompetitorIsPrimary` if the primary lists itself
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.primary_username.is_empty() {
            return Err(ModelError::EmptyUsername);
        }

        let mut seen = HashSet::new();
        for competitor in &self.competitors {
            if competitor.is_empty() {
                return Err(ModelError::EmptyUsername);
            }
            if competitor.eq_ignore_ascii_case(&self.primary_username) {
                return Err(ModelError::CompetitorIsPrimary(competitor.clone()));
            }
            if !seen.insert(competitor.to_lowercase()) {
                return Err(ModelError::DuplicateCompetitor(competitor.clone()));
            }
        }

        Ok(())
    }
}

/// Profile fields used for account classification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub biography: String,
    #[serde(default)]
    pub is_business: Option<bool>,
    #[serde(default)]
    pub category: Option<String>,
}

impl ProfileSnapshot {
    /// Snapshot with only a username
    #[must_use]
    pub fn bare(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_parse_and_display() {
        assert_eq!("Twitter".parse::<Platform>().unwrap(), Platform::Twitter);
        assert_eq!(Platform::Instagram.to_string(), "instagram");
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn account_type_serde_names() {
        let json = serde_json::to_string(&AccountType::NonBranding).unwrap();
        assert_eq!(json, "\"non-branding\"");
        assert_eq!("business".parse::<AccountType>().unwrap(), AccountType::Branding);
    }

    #[test]
    fn explicit_account_type_wins_over_detection() {
        let ctx = AccountContext::new("netflix", Platform::Facebook)
            .with_account_type(AccountType::NonBranding);
        let detected = ctx.account_type_or_else(|| panic!("detection must not run"));
        assert_eq!(detected, AccountType::NonBranding);
    }

    #[test]
    fn detection_runs_when_absent() {
        let ctx = AccountContext::new("netflix", Platform::Facebook);
        assert_eq!(ctx.account_type_or_else(|| AccountType::Branding), AccountType::Branding);
    }

    #[test]
    fn handles_are_cleaned() {
        let ctx = AccountContext::new(" @geoffreyhinton ", Platform::Twitter)
            .with_competitors(["@elonmusk", "ylecun "]);
        assert_eq!(ctx.primary_username, "geoffreyhinton");
        assert_eq!(ctx.competitors, vec!["elonmusk", "ylecun"]);
    }

    #[test]
    fn validate_rejects_duplicates_and_self() {
        let dup = AccountContext::new("a", Platform::Twitter).with_competitors(["b", "B"]);
        assert!(matches!(dup.validate(), Err(ModelError::DuplicateCompetitor(_))));

        let selfref = AccountContext::new("a", Platform::Twitter).with_competitors(["A"]);
        assert!(matches!(selfref.validate(), Err(ModelError::CompetitorIsPrimary(_))));

        let empty = AccountContext::new("  ", Platform::Twitter);
        assert!(matches!(empty.validate(), Err(ModelError::EmptyUsername)));
    }
}
