//! Application startup and lifecycle management.

use crate::config::GatewayConfig;
use crate::handlers;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::TextProvider;
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state. Read-only across requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub text_provider: Arc<dyn TextProvider>,
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.limits.max_body_bytes();

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/generate-text", post(handlers::generate_text))
        .route("/generate-from-image", post(handlers::generate_from_image))
        .route("/generate-from-document", post(handlers::generate_from_document))
        .route("/generate-from-audio", post(handlers::generate_from_audio))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application backed by the Gemini provider.
    pub async fn build(config: GatewayConfig) -> Result<Self, AppError> {
        let provider = GeminiTextProvider::new(GeminiConfig {
            api_key: config.google.api_key.clone(),
            api_base: config.google.api_base.clone(),
        })
        .map_err(|e| {
            tracing::error!("Failed to initialize Gemini provider: {}", e);
            AppError::ConfigError(anyhow::anyhow!(e))
        })?;

        tracing::info!(
            model = %config.models.text_model,
            api_base = %config.google.api_base,
            "Initialized Gemini text provider"
        );

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    /// Build the application with an injected provider (port 0 = random port for testing).
    pub async fn build_with_provider(
        config: GatewayConfig,
        text_provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            max_attachment_bytes = config.limits.max_attachment_bytes,
            provider_timeout_secs = config.provider.timeout.as_secs(),
            "GenAI gateway listening"
        );

        let state = AppState {
            config: Arc::new(config),
            text_provider,
        };

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM, then drain in-flight requests.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
