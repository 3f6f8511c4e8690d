//! Multipart decoding and payload assembly for the media endpoints.

use crate::config::PromptDefaults;
use crate::services::providers::ContentPart;
use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::http::StatusCode;
use service_core::error::AppError;

pub const PROMPT_FIELD: &str = "prompt";
const FALLBACK_MIME: &str = "application/octet-stream";

const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/json",
    "application/rtf",
    "application/xml",
];

/// The kind of attachment a media endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Document,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Document => "document",
            MediaKind::Audio => "audio",
        }
    }

    /// Multipart field carrying the attachment.
    pub fn field_name(&self) -> &'static str {
        self.as_str()
    }

    /// Instruction used when the caller sends no prompt. Images have none.
    pub fn default_prompt<'a>(&self, defaults: &'a PromptDefaults) -> Option<&'a str> {
        match self {
            MediaKind::Image => None,
            MediaKind::Document => Some(defaults.document.as_str()),
            MediaKind::Audio => Some(defaults.audio.as_str()),
        }
    }

    /// Whether a normalised media type is acceptable for this kind.
    pub fn accepts(&self, mime_type: &str) -> bool {
        match self {
            MediaKind::Image => mime_type.starts_with("image/"),
            MediaKind::Audio => mime_type.starts_with("audio/"),
            MediaKind::Document => {
                mime_type.starts_with("text/") || DOCUMENT_MIME_TYPES.contains(&mime_type)
            }
        }
    }
}

/// An uploaded file, fully buffered.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: Option<String>,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Decoded multipart form of a media endpoint.
#[derive(Debug, Default)]
pub struct MediaForm {
    pub prompt: Option<String>,
    pub attachment: Option<Attachment>,
}

/// Reads the `prompt` field and the attachment field for `kind`; other fields are skipped.
pub async fn read_media_form(
    multipart: &mut Multipart,
    kind: MediaKind,
    max_attachment_bytes: usize,
) -> Result<MediaForm, AppError> {
    let mut form = MediaForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);

        match name.as_deref() {
            Some(PROMPT_FIELD) => {
                form.prompt = Some(field.text().await.map_err(multipart_error)?);
            }
            Some(name) if name == kind.field_name() => {
                if form.attachment.is_some() {
                    return Err(AppError::BadRequest(anyhow::anyhow!(
                        "only one `{}` file may be uploaded",
                        kind.field_name()
                    )));
                }
                form.attachment = Some(read_attachment(field, max_attachment_bytes).await?);
            }
            _ => {
                tracing::debug!(field = ?name, "Ignoring unexpected multipart field");
            }
        }
    }

    Ok(form)
}

async fn read_attachment(mut field: Field<'_>, max_bytes: usize) -> Result<Attachment, AppError> {
    let file_name = field.file_name().map(str::to_owned);
    let declared = field.content_type().map(str::to_owned);

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if bytes.len() + chunk.len() > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "attachment exceeds the limit of {} bytes",
                max_bytes
            )));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(Attachment {
        mime_type: resolve_mime_type(declared.as_deref(), file_name.as_deref()),
        file_name,
        bytes,
    })
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(anyhow::anyhow!(err.body_text()))
    }
}

/// Declared type when meaningful, otherwise a guess from the file extension.
pub fn resolve_mime_type(declared: Option<&str>, file_name: Option<&str>) -> String {
    declared
        .map(essence)
        .filter(|m| !m.is_empty() && m != FALLBACK_MIME)
        .or_else(|| {
            file_name
                .and_then(|name| mime_guess::from_path(name).first())
                .map(|m| m.essence_str().to_ascii_lowercase())
        })
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}

/// `Image/JPEG; charset=binary` -> `image/jpeg`
fn essence(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub fn validate_attachment(kind: MediaKind, attachment: &Attachment) -> Result<(), AppError> {
    if attachment.bytes.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "`{}` file is empty",
            kind.field_name()
        )));
    }

    if !kind.accepts(&attachment.mime_type) {
        return Err(AppError::UnsupportedMediaType(format!(
            "media type `{}` is not accepted for {} uploads",
            attachment.mime_type,
            kind.as_str()
        )));
    }

    Ok(())
}

/// A non-blank prompt wins; otherwise the kind's default, if any.
pub fn resolve_prompt(
    kind: MediaKind,
    supplied: Option<String>,
    defaults: &PromptDefaults,
) -> Option<String> {
    supplied
        .filter(|p| !p.trim().is_empty())
        .or_else(|| kind.default_prompt(defaults).map(str::to_owned))
}

/// Text part first (when present), inline attachment second.
pub fn build_media_parts(prompt: Option<&str>, attachment: &Attachment) -> Vec<ContentPart> {
    let mut parts = Vec::with_capacity(2);
    if let Some(prompt) = prompt {
        parts.push(ContentPart::text(prompt));
    }
    parts.push(ContentPart::inline_data(
        attachment.mime_type.clone(),
        &attachment.bytes,
    ));
    parts
}
