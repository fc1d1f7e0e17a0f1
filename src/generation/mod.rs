//! Structured file-set generation through a text model.

mod gemini;
pub mod retry;

pub use gemini::{GeminiProvider, DEFAULT_API_BASE};
pub use retry::{retry_with_backoff, BackoffPolicy};

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::cancel::CancelToken;
use crate::error::{ArchitectError, Result};
use crate::events::Reporter;
use crate::model::{BuildResult, GeneratedFile};
use crate::patch::strip_code_fence;

/// Model used when neither the config file nor the command line names one.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// One request to a text model: prompt plus the JSON shape the answer must have.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub schema: Value,
}

/// A text-generation backend. Implementations return the raw text of the
/// answer and classify failures into the crate's error taxonomy, mapping
/// rate limiting to [`ArchitectError::QuotaExceeded`].
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    fn name(&self) -> &str;
}

/// Output schema every stage declares: `{ files: [{ path, content }] }`.
pub fn files_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "files": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "path": { "type": "STRING" },
                        "content": { "type": "STRING" }
                    },
                    "required": ["path", "content"]
                }
            }
        },
        "required": ["files"]
    })
}

#[derive(Deserialize)]
struct FilesPayload {
    files: Vec<GeneratedFile>,
}

/// Validates raw model text against [`files_schema`].
pub fn parse_build_result(text: &str) -> Result<BuildResult> {
    let text = strip_code_fence(text.trim());
    if text.is_empty() {
        return Err(ArchitectError::Provider("Empty response from model".into()));
    }

    let payload: FilesPayload = serde_json::from_str(&text).map_err(|e| {
        ArchitectError::Provider(format!("Response does not match the files schema: {e}"))
    })?;

    if payload.files.is_empty() {
        return Err(ArchitectError::Provider("Model returned no files".into()));
    }
    Ok(payload.files)
}

/// What one stage asks for.
#[derive(Clone, Debug)]
pub struct PromptSpec {
    /// Stage label, used as the log source.
    pub source: String,
    pub stage_index: usize,
    pub total_stages: usize,
    pub description: String,
    pub prompt: String,
}

/// Issues schema-checked generation calls, retrying on quota errors.
pub struct GenerationClient {
    provider: Arc<dyn TextProvider>,
    model: String,
    policy: BackoffPolicy,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn TextProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            policy: BackoffPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Runs one stage's request. Quota errors are retried per the policy;
    /// everything else, including schema violations, fails at once.
    pub async fn generate(
        &self,
        spec: &PromptSpec,
        reporter: &mut Reporter,
        cancel: &CancelToken,
    ) -> Result<BuildResult> {
        let request = GenerationRequest {
            model: self.model.clone(),
            prompt: spec.prompt.clone(),
            schema: files_schema(),
        };

        reporter.log(
            &spec.source,
            &format!(
                "Architecting stage {}/{}: {}",
                spec.stage_index, spec.total_stages, spec.description
            ),
        );
        tracing::info!(
            provider = self.provider.name(),
            model = %self.model,
            stage = %spec.source,
            "requesting generation"
        );

        let max_retries = self.policy.max_retries;
        let files = retry_with_backoff(
            &self.policy,
            cancel,
            |retry, delay, _| {
                reporter.log(
                    "System",
                    &format!(
                        "Quota reached. Retrying in {}s (Attempt {retry}/{max_retries})...",
                        delay.as_secs()
                    ),
                );
            },
            || async {
                let text = self.provider.generate(&request).await?;
                parse_build_result(&text)
            },
        )
        .await?;

        reporter.log(
            &spec.source,
            &format!("Verifying output: {} files received", files.len()),
        );
        Ok(files)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{files_json, ScriptedProvider};
    use super::*;

    fn spec() -> PromptSpec {
        PromptSpec {
            source: "core-managers".into(),
            stage_index: 1,
            total_stages: 3,
            description: "Core managers".into(),
            prompt: "make files".into(),
        }
    }

    #[test]
    fn test_parse_valid_payload() {
        let files = parse_build_result(&files_json(&[("a.gd", "X"), ("b.gd", "Y")])).unwrap();
        assert_eq!(files, vec![GeneratedFile::new("a.gd", "X"), GeneratedFile::new("b.gd", "Y")]);
    }

    #[test]
    fn test_parse_fenced_payload() {
        let fenced = format!("```json\n{}\n```", files_json(&[("a.gd", "X")]));
        assert_eq!(parse_build_result(&fenced).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_rejections() {
        for bad in [
            "",
            "   ",
            "not json",
            "{}",
            r#"{"files": "nope"}"#,
            r#"{"files": [{"path": "a.gd"}]}"#,
            r#"{"files": [{"path": 1, "content": "x"}]}"#,
            r#"{"files": []}"#,
        ] {
            assert!(
                matches!(parse_build_result(bad), Err(ArchitectError::Provider(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_schema_requires_files() {
        let schema = files_schema();
        assert_eq!(schema["required"][0], "files");
        assert_eq!(schema["properties"]["files"]["items"]["required"][1], "content");
    }

    #[tokio::test]
    async fn test_generate_logs_before_and_after() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(files_json(&[("a.gd", "X")]))]));
        let client = GenerationClient::new(provider.clone(), "test-model");
        let mut reporter = Reporter::silent();

        let files = client
            .generate(&spec(), &mut reporter, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(files.len(), 1);
        let messages: Vec<_> = reporter.log_entries().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "Architecting stage 1/3: Core managers",
                "Verifying output: 1 files received"
            ]
        );
        assert_eq!(provider.prompts.lock().unwrap()[0], "make files");
    }

    #[tokio::test]
    async fn test_generate_retry_bound() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(
            ArchitectError::QuotaExceeded("429 Too Many Requests".into()),
        )]));
        let client = GenerationClient::new(provider.clone(), "m").with_policy(BackoffPolicy::immediate());
        let mut reporter = Reporter::silent();

        let err = client
            .generate(&spec(), &mut reporter, &CancelToken::new())
            .await
            .unwrap_err();

        assert!(err.is_quota());
        assert_eq!(provider.calls(), 3);
        let retries: Vec<_> = reporter
            .log_entries()
            .iter()
            .filter(|e| e.source == "System")
            .map(|e| e.message.clone())
            .collect();
        assert_eq!(
            retries,
            [
                "Quota reached. Retrying in 0s (Attempt 1/2)...",
                "Quota reached. Retrying in 0s (Attempt 2/2)..."
            ]
        );
    }

    #[tokio::test]
    async fn test_schema_violation_not_retried() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok("{\"oops\": true}".into())]));
        let client = GenerationClient::new(provider.clone(), "m").with_policy(BackoffPolicy::immediate());

        let err = client
            .generate(&spec(), &mut Reporter::silent(), &CancelToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ArchitectError::Provider(_)));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_token_prevents_call() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(files_json(&[("a.gd", "X")]))]));
        let client = GenerationClient::new(provider.clone(), "m");
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = client
            .generate(&spec(), &mut Reporter::silent(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ArchitectError::Cancelled));
        assert_eq!(provider.calls(), 0);
    }

    struct SlowProvider;

    #[async_trait]
    impl TextProvider for SlowProvider {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            Ok(files_json(&[("a.gd", "X")]))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_cancel_interrupts_running_request() {
        let client = GenerationClient::new(Arc::new(SlowProvider), "m");
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let result = client.generate(&spec(), &mut Reporter::silent(), &cancel).await;

        assert!(matches!(result, Err(ArchitectError::Cancelled)));
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }
}
