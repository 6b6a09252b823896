//! LLM Client: the single point of entry for every AI provider call in the screener.
//!
//! ARCHITECTURAL RULE: No other module may talk to a provider API directly.
//! Screening code depends on the `CompletionProvider` trait only, which lets the
//! orchestrator swap providers and lets tests script failures.
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

pub mod gemini;
pub mod openai;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Provider unavailable after {retries} attempts")]
    RetriesExhausted { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// How a failed provider call should be treated by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// Quota, rate or billing exhaustion.
    QuotaExceeded,
    /// Credentials rejected or not permitted.
    AuthRejected,
    /// Anything that only affects the current call.
    Transient,
}

impl FailureCategory {
    /// Systemic failures disable the provider for the rest of the process.
    pub fn is_systemic(self) -> bool {
        !matches!(self, FailureCategory::Transient)
    }
}

impl LlmError {
    /// Structured classification: the HTTP status decides when there is one,
    /// message matching is the fallback for errors that carry only text.
    pub fn category(&self) -> FailureCategory {
        match self {
            LlmError::Api { status, message } => match status {
                429 | 402 => FailureCategory::QuotaExceeded,
                401 | 403 => FailureCategory::AuthRejected,
                _ => classify_message(message),
            },
            other => classify_message(&other.to_string()),
        }
    }
}

const QUOTA_SIGNATURES: &[&str] = &[
    "quota",
    "limit",
    "billing",
    "resource_exhausted",
    "exhausted",
    "429",
];

const AUTH_SIGNATURES: &[&str] = &[
    "403",
    "401",
    "permission",
    "forbidden",
    "unauthorized",
    "api key",
    "api_key",
];

/// Last-resort classifier for providers that only expose an error string.
pub fn classify_message(message: &str) -> FailureCategory {
    let lower = message.to_lowercase();
    if QUOTA_SIGNATURES.iter().any(|sig| lower.contains(sig)) {
        FailureCategory::QuotaExceeded
    } else if AUTH_SIGNATURES.iter().any(|sig| lower.contains(sig)) {
        FailureCategory::AuthRejected
    } else {
        FailureCategory::Transient
    }
}

/// A text-completion backend. Implemented by the HTTP clients below and by
/// scripted fakes in tests.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short provider label used in logs and audit fields.
    fn name(&self) -> &str;

    /// Sends one prompt and returns the raw completion text.
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;

    /// Classifies a failure produced by `complete`.
    fn classify(&self, error: &LlmError) -> FailureCategory {
        error.category()
    }
}

pub(crate) fn build_http_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .expect("Failed to build HTTP client")
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Pulls the provider's own error message (plus status/code tags) out of an
/// error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => {
            let mut message = envelope.error.message;
            if let Some(status) = envelope.error.status {
                message.push_str(&format!(" [{status}]"));
            }
            if let Some(serde_json::Value::String(code)) = envelope.error.code {
                message.push_str(&format!(" [{code}]"));
            }
            message
        }
        Err(_) => body.to_string(),
    }
}

/// Sends a request built by `build`, retrying network errors and 5xx with
/// exponential backoff. 429 is returned immediately: it is a quota signature
/// the orchestrator must see.
pub(crate) async fn send_with_retry<F>(provider: &str, build: F) -> Result<String, LlmError>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s
            let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
            warn!(
                "{provider} call attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let response = match build().send().await {
            Ok(r) => r,
            Err(e) => {
                last_error = Some(LlmError::Http(e));
                continue;
            }
        };

        let status = response.status();

        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("{provider} API returned {}: {}", status, body);
            last_error = Some(LlmError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
            continue;
        }

        let body = response.text().await?;

        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        return Ok(body);
    }

    Err(last_error.unwrap_or(LlmError::RetriesExhausted {
        retries: MAX_RETRIES,
    }))
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Fills `{name}` placeholders in a single pass. Substituted text is never
/// rescanned, and `{...}` sequences without a value are kept verbatim.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let found = tail[1..].find('}').and_then(|close| {
            let name = &tail[1..1 + close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close + 2))
        });
        match found {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &tail[consumed..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
