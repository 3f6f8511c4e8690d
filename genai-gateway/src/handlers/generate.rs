//! Generation endpoints: route → validate → encode payload → delegate → relay.

use super::media::{self, MediaKind};
use crate::config::ProviderConfig;
use crate::dtos::{GenerateResponse, GenerateTextRequest};
use crate::services::metrics;
use crate::services::providers::{ContentPart, ProviderError};
use crate::startup::AppState;
use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, Multipart, State,
    },
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use std::time::Instant;
use validator::Validate;

const GENERIC_FAILURE_MESSAGE: &str = "Generation failed";

pub async fn generate_text(
    State(state): State<AppState>,
    payload: Result<Json<GenerateTextRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let Json(req) = payload.map_err(json_error)?;
    req.validate()?;

    if req.prompt.trim().is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "prompt must not be empty"
        )));
    }

    let parts = vec![ContentPart::text(req.prompt)];
    relay(&state, "text", &parts).await
}

pub async fn generate_from_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    generate_from_media(&state, MediaKind::Image, multipart).await
}

pub async fn generate_from_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    generate_from_media(&state, MediaKind::Document, multipart).await
}

pub async fn generate_from_audio(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    generate_from_media(&state, MediaKind::Audio, multipart).await
}

fn json_error(err: JsonRejection) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(anyhow::anyhow!(err.body_text()))
    }
}

async fn generate_from_media(
    state: &AppState,
    kind: MediaKind,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let mut multipart =
        multipart.map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;

    let form = media::read_media_form(
        &mut multipart,
        kind,
        state.config.limits.max_attachment_bytes,
    )
    .await?;

    let attachment = form.attachment.ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("missing `{}` file", kind.field_name()))
    })?;
    media::validate_attachment(kind, &attachment)?;

    let prompt = media::resolve_prompt(kind, form.prompt, &state.config.prompts);

    tracing::info!(
        endpoint = kind.as_str(),
        mime_type = %attachment.mime_type,
        size = attachment.bytes.len(),
        file_name = ?attachment.file_name,
        has_prompt = prompt.is_some(),
        "Media generation request"
    );

    let parts = media::build_media_parts(prompt.as_deref(), &attachment);
    relay(state, kind.as_str(), &parts).await
}

/// The single suspension point of a request: one bounded provider call.
async fn relay(
    state: &AppState,
    endpoint: &'static str,
    parts: &[ContentPart],
) -> Result<Json<GenerateResponse>, AppError> {
    let model = state.config.models.text_model.as_str();
    let timeout = state.config.provider.timeout;
    let started = Instant::now();

    let outcome = match tokio::time::timeout(timeout, state.text_provider.generate(model, parts))
        .await
    {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(timeout)),
    };
    let latency = started.elapsed();

    match outcome {
        Ok(response) => {
            metrics::record_generation(endpoint, "success", latency);
            metrics::record_tokens(endpoint, response.input_tokens, response.output_tokens);
            tracing::info!(
                endpoint,
                model = %model,
                input_tokens = response.input_tokens,
                output_tokens = response.output_tokens,
                finish_reason = ?response.finish_reason,
                latency_ms = latency.as_millis() as u64,
                "Generation succeeded"
            );
            Ok(Json(GenerateResponse {
                result: response.text,
            }))
        }
        Err(err) => {
            metrics::record_generation(endpoint, "error", latency);
            tracing::error!(
                endpoint,
                model = %model,
                error = %err,
                latency_ms = latency.as_millis() as u64,
                "Generation failed"
            );
            Err(provider_failure(&state.config.provider, err))
        }
    }
}

fn provider_failure(config: &ProviderConfig, err: ProviderError) -> AppError {
    if config.expose_errors {
        AppError::Upstream(err.to_string())
    } else {
        AppError::Upstream(GENERIC_FAILURE_MESSAGE.to_string())
    }
}
