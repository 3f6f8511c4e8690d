//! AI provider abstractions and implementations.
//!
//! Handlers only see the [`TextProvider`] trait, so the Gemini backend can be
//! swapped for the in-process mock in tests.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Error reported by the provider itself; `message` is the provider's own text.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Content filtered: {0}")]
    ContentFiltered(String),

    #[error("Provider returned no text")]
    EmptyResponse,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Provider did not respond within {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// Convenience constructor for provider-side failures.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

/// One segment of the content sent to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentPart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    InlineData {
        inline_data: InlineData,
    },
}

/// Base64-encoded bytes plus their media-type label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Encodes `bytes` with standard padded base64.
    pub fn inline_data(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: STANDARD.encode(bytes),
            },
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
}

impl InlineData {
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

/// Result of a provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub text: String,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,

    pub finish_reason: FinishReason,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
    Other,
}

impl FinishReason {
    pub fn from_gemini(reason: Option<&str>) -> Self {
        match reason {
            None | Some("STOP") => FinishReason::Complete,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") | Some("SPII")
            | Some("RECITATION") => FinishReason::ContentFilter,
            Some(_) => FinishReason::Other,
        }
    }
}

/// Trait for text generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate text from an ordered list of content parts with the given model.
    async fn generate(
        &self,
        model: &str,
        parts: &[ContentPart],
    ) -> Result<ProviderResponse, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
