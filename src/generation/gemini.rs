//! Gemini `generateContent` REST provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{GenerationRequest, TextProvider};
use crate::error::{ArchitectError, Result};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

const PROVIDER_NAME: &str = "gemini";

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ArchitectError::Config(
                "No API key configured. Set GEMINI_API_KEY.".into(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into(),
        })
    }

    fn api_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Maps a failed HTTP response to the error taxonomy. Quota exhaustion is
/// recognised by status code, by the `RESOURCE_EXHAUSTED` status and by a
/// `429` anywhere in the message.
pub(crate) fn classify_error(status: StatusCode, body: &str) -> ArchitectError {
    let (message, api_status) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.message, envelope.error.status),
        Err(_) => (body.trim().to_string(), String::new()),
    };

    let detail = format!("HTTP {status}: {message}");
    if status == StatusCode::TOO_MANY_REQUESTS
        || api_status == "RESOURCE_EXHAUSTED"
        || message.contains("429")
    {
        ArchitectError::QuotaExceeded(detail)
    } else {
        ArchitectError::Provider(detail)
    }
}

/// Concatenated text of the first candidate's parts.
pub(crate) fn extract_text(body: &str) -> Result<String> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| ArchitectError::Provider(format!("Unreadable response envelope: {e}")))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ArchitectError::Provider("Response contained no text".into()));
    }
    Ok(text)
}

#[async_trait]
impl TextProvider for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let url = self.api_url(&request.model);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &request.schema,
            },
        };

        tracing::debug!("Sending request to {}: {}", PROVIDER_NAME, url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("{} request failed: {}", PROVIDER_NAME, e);
                e
            })?;

        let status = response.status();
        let text = response.text().await?;
        tracing::debug!("{} response status: {}", PROVIDER_NAME, status);

        if !status.is_success() {
            return Err(classify_error(status, &text));
        }
        extract_text(&text)
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_quota_by_status_code() {
        let err = classify_error(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(err.is_quota());
    }

    #[test]
    fn test_classify_quota_by_api_status() {
        let body = r#"{"error": {"code": 400, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert!(classify_error(StatusCode::BAD_REQUEST, body).is_quota());
    }

    #[test]
    fn test_classify_quota_by_message() {
        let body = r#"{"error": {"message": "upstream said 429", "status": "UNAVAILABLE"}}"#;
        assert!(classify_error(StatusCode::SERVICE_UNAVAILABLE, body).is_quota());
    }

    #[test]
    fn test_classify_other_failures() {
        let body = r#"{"error": {"message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        match classify_error(StatusCode::BAD_REQUEST, body) {
            ArchitectError::Provider(msg) => {
                assert!(msg.contains("400"));
                assert!(msg.contains("API key not valid"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "{\"files\""}, {"text": ": []}"}]}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "{\"files\": []}");
    }

    #[test]
    fn test_extract_text_missing_candidate() {
        assert!(matches!(
            extract_text(r#"{"candidates": []}"#),
            Err(ArchitectError::Provider(_))
        ));
        assert!(matches!(
            extract_text(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#),
            Err(ArchitectError::Provider(_))
        ));
        assert!(matches!(extract_text("<html>"), Err(ArchitectError::Provider(_))));
    }

    #[test]
    fn test_request_shape() {
        let schema = super::super::files_schema();
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &schema,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_api_url_and_key_check() {
        let provider = GeminiProvider::new("key", "http://localhost:8080/").unwrap();
        assert_eq!(
            provider.api_url("gemini-test"),
            "http://localhost:8080/v1beta/models/gemini-test:generateContent"
        );
        assert!(matches!(
            GeminiProvider::new("  ", DEFAULT_API_BASE),
            Err(ArchitectError::Config(_))
        ));
    }
}
