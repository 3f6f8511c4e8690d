#![allow(dead_code)]

use genai_gateway::config::{
    GatewayConfig, GoogleConfig, LimitsConfig, ModelConfig, PromptDefaults, ProviderConfig,
};
use genai_gateway::services::providers::mock::MockTextProvider;
use genai_gateway::startup::Application;
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

pub const TEST_MODEL: &str = "gemini-test-model";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub provider: Arc<MockTextProvider>,
    pub client: reqwest::Client,
}

/// Configuration that never touches the environment.
pub fn test_config() -> GatewayConfig {
    GatewayConfig {
        common: CoreConfig {
            port: 0, // Random port for testing
            log_level: "debug".to_string(),
        },
        models: ModelConfig {
            text_model: TEST_MODEL.to_string(),
        },
        google: GoogleConfig {
            api_key: Secret::new("test-api-key".to_string()),
            api_base: "http://127.0.0.1:9".to_string(),
        },
        limits: LimitsConfig::default(),
        provider: ProviderConfig::default(),
        prompts: PromptDefaults::default(),
        otlp_endpoint: None,
    }
}

impl TestApp {
    pub async fn spawn(provider: MockTextProvider) -> Self {
        Self::spawn_with_config(test_config(), provider).await
    }

    pub async fn spawn_with_config(config: GatewayConfig, provider: MockTextProvider) -> Self {
        let provider = Arc::new(provider);

        let app = Application::build_with_provider(config, provider.clone())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            provider,
            client,
        }
    }

    pub async fn post_text(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/generate-text", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_form(&self, path: &str, form: reqwest::multipart::Form) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

pub fn file_part(bytes: Vec<u8>, file_name: &str, mime: &str) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(mime)
        .unwrap()
}

/// Smallest byte prefix recognisable as a JPEG.
pub fn jpeg_bytes() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00]
}
