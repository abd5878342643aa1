//! Error types for the data model

/// Invalid caller input or unparseable enum names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Blank username
    #[error("username must not be empty")]
    EmptyUsername,

    /// Competitor listed more than once
    #[error("duplicate competitor: {0}")]
    DuplicateCompetitor(String),

    /// Primary account listed among its own competitors
    #[error("competitor '{0}' is the primary account")]
    CompetitorIsPrimary(String),

    /// Unsupported platform name
    #[error("unknown platform: '{0}'")]
    UnknownPlatform(String),

    /// Unsupported account type name
    #[error("unknown account type: '{0}'")]
    UnknownAccountType(String),
}
