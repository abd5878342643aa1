//! Per-attempt validation report

use serde::{Deserialize, Serialize};

/// Outcome of auditing one attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub attempt_number: u32,
    /// Human-readable issues, in check order
    pub issues: Vec<String>,
    pub passed: bool,
}

impl ValidationReport {
    /// Build a report; passes iff `issues` is empty
    #[must_use]
    pub fn from_issues(attempt_number: u32, issues: Vec<String>) -> Self {
        let passed = issues.is_empty();
        Self {
            attempt_number,
            issues,
            passed,
        }
    }

    /// Report for an attempt that raised instead of producing a plan
    #[must_use]
    pub fn errored(attempt_number: u32, message: impl Into<String>) -> Self {
        Self::from_issues(attempt_number, vec![message.into()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_only_without_issues() {
        assert!(ValidationReport::from_issues(1, vec![]).passed);
        assert!(!ValidationReport::errored(2, "boom").passed);
    }
}
