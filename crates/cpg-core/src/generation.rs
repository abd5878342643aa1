//! Generative capability
//!
//! - [`Generator`]: `generate(module, prompt_context, output_schema) -> json`
//! - [`ModuleKey`]: the plan module a request is for, with its output schema
//! - [`CommandGenerator`]: runs a model CLI (`<exe> -p <prompt> [--model m]`)

use crate::error::GenerationError;
use async_trait::async_trait;
use cpg_model::{CompetitorAnalysis, ImprovementRecommendations, NextPostPrediction, Recommendation};
use schemars::schema_for;
use serde_json::Value;
use std::fmt;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Plan module a generation request targets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleKey {
    NextPost,
    Improvements,
    CompetitorAnalysis(String),
    Recommendation,
}

impl ModuleKey {
    /// Plan section name
    #[must_use]
    pub fn section(&self) -> &'static str {
        match self {
            Self::NextPost => "next_post_prediction",
            Self::Improvements => "improvement_recommendations",
            Self::CompetitorAnalysis(_) => "competitor_analysis",
            Self::Recommendation => "recommendation",
        }
    }

    /// JSON schema the generated object must satisfy
    #[must_use]
    pub fn output_schema(&self) -> Value {
        let schema = match self {
            Self::NextPost => schema_for!(NextPostPrediction),
            Self::Improvements => schema_for!(ImprovementRecommendations),
            Self::CompetitorAnalysis(_) => schema_for!(CompetitorAnalysis),
            Self::Recommendation => schema_for!(Recommendation),
        };
        serde_json::to_value(schema).unwrap_or(Value::Null)
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CompetitorAnalysis(name) => write!(f, "competitor_analysis.{name}"),
            other => f.write_str(other.section()),
        }
    }
}

/// Structured-output generation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        module: &ModuleKey,
        prompt_context: &Value,
        output_schema: &Value,
    ) -> Result<Value, GenerationError>;
}

/// Render the prompt text sent to a text-in/text-out model
#[must_use]
pub fn render_prompt(module: &ModuleKey, prompt_context: &Value, output_schema: &Value) -> String {
    let context = serde_json::to_string_pretty(prompt_context).unwrap_or_default();
    let schema = serde_json::to_string_pretty(output_schema).unwrap_or_default();
    let mut prompt = format!(
        "You are a social media strategist. Produce the `{module}` section of a content plan.\n\
         Base every statement on the account context and retrieved posts below; never invent \
         hashtags from the account name.\n\n\
         ACCOUNT CONTEXT:\n{context}\n\n\
         Respond with a single JSON object matching this schema and nothing else:\n{schema}\n"
    );
    if let Some(feedback) = prompt_context.get("correction_feedback") {
        let _ = write!(
            prompt,
            "\nThe previous attempt was rejected. Fix every one of these issues:\n{}\n",
            serde_json::to_string_pretty(feedback).unwrap_or_default()
        );
    }
    prompt
}

/// Extract the JSON payload from a model response
///
/// Takes the first fenced block when present (language tag skipped),
/// otherwise the outermost `{...}` span, otherwise the trimmed text.
#[must_use]
pub fn clean_response(input: &str) -> &str {
    if let Some(start) = input.find("```") {
        let after = &input[start + 3..];
        let body_start = after.find('\n').map_or(0, |n| n + 1);
        if let Some(end) = after[body_start..].find("```") {
            return after[body_start..body_start + end].trim();
        }
    }
    match (input.find('{'), input.rfind('}')) {
        (Some(open), Some(close)) if open < close => &input[open..=close],
        _ => input.trim(),
    }
}

/// Generator backed by a model command-line tool
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    executable: String,
    model: Option<String>,
    work_dir: Option<PathBuf>,
    timeout: Duration,
}

impl CommandGenerator {
    #[must_use]
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            model: None,
            work_dir: None,
            timeout: Duration::from_secs(120),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, prompt: &str) -> Result<String, GenerationError> {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("-p").arg(prompt);
        if let Some(model) = &self.model {
            cmd.arg("--model").arg(model);
        }
        if let Some(dir) = &self.work_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null()).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout))?
            .map_err(|e| GenerationError::Launch {
                executable: self.executable.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(GenerationError::CommandFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Generator for CommandGenerator {
    async fn generate(
        &self,
        module: &ModuleKey,
        prompt_context: &Value,
        output_schema: &Value,
    ) -> Result<Value, GenerationError> {
        let prompt = render_prompt(module, prompt_context, output_schema);
        debug!(module = %module, prompt_chars = prompt.len(), "invoking generator command");

        let stdout = self.run(&prompt).await?;
        let payload = clean_response(&stdout);
        let value: Value = serde_json::from_str(payload).map_err(|e| GenerationError::InvalidJson {
            module: module.to_string(),
            reason: e.to_string(),
        })?;
        if !value.is_object() {
            return Err(GenerationError::SchemaMismatch {
                module: module.to_string(),
                reason: "expected a json object".into(),
            });
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn clean_response_handles_fences_and_prose() {
        assert_eq!(clean_response("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(clean_response("Sure! Here it is: {\"a\": {\"b\": 2}} hope it helps"), "{\"a\": {\"b\": 2}}");
        assert_eq!(clean_response("  plain  "), "plain");
    }

    #[test]
    fn module_labels_and_schemas() {
        let m = ModuleKey::CompetitorAnalysis("sama".into());
        assert_eq!(m.to_string(), "competitor_analysis.sama");
        assert_eq!(m.section(), "competitor_analysis");

        let schema = ModuleKey::NextPost.output_schema();
        let required = schema["required"].as_array().unwrap();
        for field in ["caption", "hashtags", "image_prompt", "call_to_action"] {
            assert!(required.contains(&json!(field)), "{field} not required");
        }
        assert!(schema["properties"].get("placeholder").is_none());
    }

    #[test]
    fn prompt_carries_feedback() {
        let ctx = json!({ "correction_feedback": { "attempt": 2, "issues": ["MISSING: recommendation module"] } });
        let prompt = render_prompt(&ModuleKey::Recommendation, &ctx, &json!({}));
        assert!(prompt.contains("previous attempt was rejected"));
        assert!(prompt.contains("MISSING: recommendation module"));
    }

    #[tokio::test]
    async fn missing_executable_is_a_launch_error() {
        let gen = CommandGenerator::new("definitely-not-a-real-model-cli-xyz");
        let err = gen
            .generate(&ModuleKey::NextPost, &json!({}), &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Launch { .. }));
    }

    #[cfg(unix)]
    fn script(dir: &std::path::Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-model");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fenced_command_output_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(
            dir.path(),
            "printf '%s\\n' 'Here you go:' '```json' '{\"recommendations\": [\"a\"]}' '```'",
        );
        let value = CommandGenerator::new(exe)
            .with_model("test-model")
            .generate(&ModuleKey::Improvements, &json!({}), &json!({}))
            .await
            .unwrap();
        assert_eq!(value, json!({ "recommendations": ["a"] }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_and_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "echo boom >&2; exit 3");
        let err = CommandGenerator::new(exe)
            .generate(&ModuleKey::NextPost, &json!({}), &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::CommandFailed { ref stderr, .. } if stderr == "boom"));

        let slow_dir = tempfile::tempdir().unwrap();
        let slow = script(slow_dir.path(), "sleep 5");
        let err = CommandGenerator::new(slow)
            .with_timeout(Duration::from_millis(100))
            .generate(&ModuleKey::NextPost, &json!({}), &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err, GenerationError::Timeout(Duration::from_millis(100)));
    }
}
