//! Retry controller
//!
//! State machine per request:
//! `START -> GENERATE -> VALIDATE -> DONE | GENERATE | DONE_WITH_ISSUES`
//!
//! - attempts run sequentially; `max_retries = N` allows `max(N, 1)` attempts
//! - request caches are invalidated before every attempt after the first
//! - an error or panic while generating or validating counts as a failed
//!   attempt; on the final attempt its message is the terminal issue
//! - an error that [`PipelineError::is_retryable`] rejects ends the run at
//!   once with its message as the terminal issue
//! - every attempt's [`ValidationReport`] is kept

use crate::cache::{CacheScope, RequestCache};
use crate::error::PipelineError;
use cpg_audit::QualityAuditor;
use cpg_model::{AccountContext, ContentPlan, ValidationReport};
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{info, info_span, warn, Instrument};

/// Issues of a failed attempt, passed to the next one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptFeedback {
    /// Attempt that produced these issues
    pub attempt: u32,
    pub issues: Vec<String>,
}

/// What the generate step receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRequest {
    /// 1-based attempt number
    pub attempt: u32,
    /// Previous attempt's issues; `None` on the first attempt
    pub feedback: Option<AttemptFeedback>,
}

/// Terminal state of a retry run
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Audit passed
    Verified {
        plan: ContentPlan,
        attempts_used: u32,
        reports: Vec<ValidationReport>,
    },
    /// Budget spent without a passing audit
    Exhausted {
        /// Last plan any attempt produced, kept for diagnostics
        plan: Option<ContentPlan>,
        /// Issues of the final attempt
        issues: Vec<String>,
        attempts_used: u32,
        reports: Vec<ValidationReport>,
    },
}

impl RunOutcome {
    #[inline]
    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    #[must_use]
    pub fn attempts_used(&self) -> u32 {
        match self {
            Self::Verified { attempts_used, .. } | Self::Exhausted { attempts_used, .. } => {
                *attempts_used
            }
        }
    }

    /// Issues of the terminal attempt (empty when verified)
    #[must_use]
    pub fn issues(&self) -> &[String] {
        match self {
            Self::Verified { .. } => &[],
            Self::Exhausted { issues, .. } => issues,
        }
    }

    #[must_use]
    pub fn reports(&self) -> &[ValidationReport] {
        match self {
            Self::Verified { reports, .. } | Self::Exhausted { reports, .. } => reports,
        }
    }
}

/// Drives generate/validate cycles under a retry budget
#[derive(Debug, Clone)]
pub struct RetryController {
    auditor: QualityAuditor,
    cache: RequestCache,
    max_retries: u32,
}

impl RetryController {
    #[must_use]
    pub fn new(auditor: QualityAuditor, cache: RequestCache, max_retries: u32) -> Self {
        Self {
            auditor,
            cache,
            max_retries,
        }
    }

    /// Attempts this controller will make at most
    #[inline]
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Run the loop; `generate` builds a fresh plan for each attempt
    pub async fn run<F, Fut>(&self, context: &AccountContext, mut generate: F) -> RunOutcome
    where
        F: FnMut(AttemptRequest) -> Fut,
        Fut: Future<Output = Result<ContentPlan, PipelineError>>,
    {
        let max_attempts = self.max_attempts();
        let mut reports: Vec<ValidationReport> = Vec::with_capacity(max_attempts as usize);
        let mut last_plan = None;

        for attempt in 1..=max_attempts {
            let feedback = reports.last().map(|r: &ValidationReport| AttemptFeedback {
                attempt: r.attempt_number,
                issues: r.issues.clone(),
            });
            if attempt > 1 {
                self.cache.invalidate(CacheScope::All).await;
                info!(attempt, epoch = self.cache.epoch(), "caches invalidated before retry");
            }

            let span = info_span!("attempt", attempt, max_attempts);
            let generated = AssertUnwindSafe(generate(AttemptRequest { attempt, feedback }))
                .catch_unwind()
                .instrument(span.clone())
                .await;

            let mut permanent = false;
            let report = match generated {
                Ok(Ok(plan)) => {
                    let audited = std::panic::catch_unwind(AssertUnwindSafe(|| {
                        self.auditor.audit(&plan, context)
                    }));
                    match audited {
                        Ok(report) => {
                            let report = ValidationReport {
                                attempt_number: attempt,
                                ..report
                            };
                            if report.passed {
                                span.in_scope(|| info!("attempt verified"));
                                reports.push(report);
                                return RunOutcome::Verified {
                                    plan,
                                    attempts_used: attempt,
                                    reports,
                                };
                            }
                            last_plan = Some(plan);
                            report
                        }
                        Err(panic) => ValidationReport::errored(
                            attempt,
                            format!("VALIDATION ERROR: {}", panic_message(panic.as_ref())),
                        ),
                    }
                }
                Ok(Err(error)) => {
                    permanent = !error.is_retryable();
                    ValidationReport::errored(attempt, format!("GENERATION ERROR: {error}"))
                }
                Err(panic) => ValidationReport::errored(
                    attempt,
                    format!(
                        "GENERATION ERROR: {}",
                        PipelineError::Panicked(panic_message(panic.as_ref()))
                    ),
                ),
            };

            span.in_scope(|| {
                warn!(issues = report.issues.len(), "attempt failed validation");
                for issue in &report.issues {
                    warn!(%issue, "validation issue");
                }
            });
            reports.push(report);

            if permanent {
                warn!(attempt, "error is not retryable; stopping");
                return Self::exhausted(last_plan, attempt, reports);
            }
        }

        warn!(attempts = max_attempts, "retry budget exhausted");
        Self::exhausted(last_plan, max_attempts, reports)
    }

    fn exhausted(
        plan: Option<ContentPlan>,
        attempts_used: u32,
        reports: Vec<ValidationReport>,
    ) -> RunOutcome {
        let issues = reports.last().map(|r| r.issues.clone()).unwrap_or_default();
        RunOutcome::Exhausted {
            plan,
            issues,
            attempts_used,
            reports,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
