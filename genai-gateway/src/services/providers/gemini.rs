//! Gemini AI provider implementation.
//!
//! Implements non-streaming text generation against Google's Gemini
//! `generateContent` endpoint.

use super::{ContentPart, FinishReason, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Secret<String>,
    /// Base URL including the API version, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub api_base: String,
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        if config.api_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Build the API URL for the given model and method.
    fn api_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.api_base.trim_end_matches('/'),
            model,
            method
        )
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(
        &self,
        model: &str,
        parts: &[ContentPart],
    ) -> Result<ProviderResponse, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
        };

        tracing::debug!(
            model = %model,
            part_count = parts.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.api_url(model, "generateContent"))
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &error_text));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::NetworkError(format!("Failed to parse response: {}", e)))?;

        api_response.into_provider_response()
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let url = format!("{}/models", self.config.api_base.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::api(
                response.status().as_u16(),
                format!("Health check failed: {}", response.status()),
            ))
        }
    }
}

/// Turns a non-2xx body into a provider error, preferring Gemini's own message.
fn api_error(status: u16, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|m| !m.is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| format!("Gemini API returned status {}", status));

    ProviderError::Api { status, message }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: &'a [ContentPart],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

/// Response parts may carry shapes other than text; only text is read.
#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl GenerateContentResponse {
    fn into_provider_response(self) -> Result<ProviderResponse, ProviderError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ProviderError::ContentFiltered(format!(
                "prompt blocked: {}",
                reason
            )));
        }

        let usage = self.usage_metadata.unwrap_or_default();
        let candidate = self.candidates.into_iter().next();

        let finish_reason_raw = candidate.as_ref().and_then(|c| c.finish_reason.clone());
        let finish_reason = FinishReason::from_gemini(finish_reason_raw.as_deref());

        let text: String = candidate
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(match finish_reason {
                FinishReason::ContentFilter => ProviderError::ContentFiltered(
                    finish_reason_raw.unwrap_or_else(|| "SAFETY".to_string()),
                ),
                _ => ProviderError::EmptyResponse,
            });
        }

        Ok(ProviderResponse {
            text,
            input_tokens: usage.prompt_token_count.unwrap_or(0),
            output_tokens: usage.candidates_token_count.unwrap_or(0),
            finish_reason,
        })
    }
}
