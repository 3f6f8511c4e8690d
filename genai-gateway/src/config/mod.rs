use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default upper bound for a single uploaded attachment (20 MiB).
pub const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 20 * 1024 * 1024;

/// Allowance for multipart boundaries and the prompt field on top of the attachment.
pub const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 120;
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

pub const DEFAULT_DOCUMENT_PROMPT: &str = "Please produce a summary of the following document.";
pub const DEFAULT_AUDIO_PROMPT: &str = "Please produce a transcript of the following recording.";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub common: core_config::Config,
    pub models: ModelConfig,
    pub google: GoogleConfig,
    pub limits: LimitsConfig,
    pub provider: ProviderConfig,
    pub prompts: PromptDefaults,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model used for every generation request (e.g., gemini-2.5-flash)
    pub text_model: String,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: Secret<String>,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub max_attachment_bytes: usize,
}

impl LimitsConfig {
    /// Whole request body limit applied by the router.
    pub fn max_body_bytes(&self) -> usize {
        self.max_attachment_bytes.saturating_add(FORM_OVERHEAD_BYTES)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub timeout: Duration,
    /// When false, provider failure messages are replaced by a generic one.
    pub expose_errors: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            expose_errors: true,
        }
    }
}

/// Instructions substituted when a media request arrives without a prompt.
#[derive(Debug, Clone)]
pub struct PromptDefaults {
    pub document: String,
    pub audio: String,
}

impl Default for PromptDefaults {
    fn default() -> Self {
        Self {
            document: DEFAULT_DOCUMENT_PROMPT.to_string(),
            audio: DEFAULT_AUDIO_PROMPT.to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let api_key = match env::var("GOOGLE_API_KEY") {
            Ok(key) => key,
            Err(_) => get_env("API_KEY", None, false).map_err(|_| {
                AppError::ConfigError(anyhow::anyhow!(
                    "GOOGLE_API_KEY (or API_KEY) is required but not set"
                ))
            })?,
        };

        Ok(GatewayConfig {
            common: common_config,
            models: ModelConfig {
                text_model: get_env("GENAI_TEXT_MODEL", Some(DEFAULT_TEXT_MODEL), is_prod)?,
            },
            google: GoogleConfig {
                api_key: Secret::new(api_key),
                api_base: get_env("GEMINI_API_BASE", Some(DEFAULT_GEMINI_API_BASE), false)?,
            },
            limits: LimitsConfig {
                max_attachment_bytes: get_parsed(
                    "GATEWAY_MAX_ATTACHMENT_BYTES",
                    DEFAULT_MAX_ATTACHMENT_BYTES,
                )?,
            },
            provider: ProviderConfig {
                timeout: provider_timeout(get_parsed(
                    "GATEWAY_PROVIDER_TIMEOUT_SECS",
                    DEFAULT_PROVIDER_TIMEOUT_SECS,
                )?)?,
                expose_errors: get_parsed("GATEWAY_EXPOSE_PROVIDER_ERRORS", true)?,
            },
            prompts: PromptDefaults {
                document: get_env("GATEWAY_DOCUMENT_PROMPT", Some(DEFAULT_DOCUMENT_PROMPT), false)?,
                audio: get_env("GATEWAY_AUDIO_PROMPT", Some(DEFAULT_AUDIO_PROMPT), false)?,
            },
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
        })
    }
}

/// Provider timeouts must be non-zero.
fn provider_timeout(secs: u64) -> Result<Duration, AppError> {
    if secs == 0 {
        return Err(AppError::ConfigError(anyhow::anyhow!(
            "GATEWAY_PROVIDER_TIMEOUT_SECS must be greater than zero"
        )));
    }
    Ok(Duration::from_secs(secs))
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn get_parsed<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
    })
}
