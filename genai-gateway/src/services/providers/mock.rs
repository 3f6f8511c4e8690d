//! Mock provider implementation for testing.

use super::{ContentPart, FinishReason, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// What the mock answers with.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    Reply(String),
    Fail(ProviderError),
    /// Never resolves; exercises the handler timeout.
    Hang,
}

/// A call captured by [`MockTextProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub model: String,
    pub parts: Vec<ContentPart>,
}

/// Mock text provider that records every call.
pub struct MockTextProvider {
    behavior: MockBehavior,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTextProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(MockBehavior::Reply(text.into()))
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::new(MockBehavior::Fail(error))
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        model: &str,
        parts: &[ContentPart],
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.lock().await.push(RecordedCall {
            model: model.to_string(),
            parts: parts.to_vec(),
        });

        match &self.behavior {
            MockBehavior::Reply(text) => Ok(ProviderResponse {
                text: text.clone(),
                input_tokens: parts.len() as i32,
                output_tokens: text.len() as i32 / 4,
                finish_reason: FinishReason::Complete,
            }),
            MockBehavior::Fail(err) => Err(err.clone()),
            MockBehavior::Hang => std::future::pending().await,
        }
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        match &self.behavior {
            MockBehavior::Fail(err) => Err(err.clone()),
            _ => Ok(()),
        }
    }
}
