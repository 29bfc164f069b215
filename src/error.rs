//! Error types for the lead intake service.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited (HTTP 429), retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Lead classification errors. Never surfaced to callers: the classifier
/// turns them into a fallback verdict.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("{0}")]
    Llm(#[from] LlmError),

    #[error("Unparseable verdict: {0}")]
    Parse(String),

    #[error("Unknown {field} label: '{value}'")]
    UnknownLabel { field: &'static str, value: String },

    /// The model stopped before writing a complete verdict.
    #[error("Model reply cut short by {cause}")]
    Incomplete { cause: &'static str },
}

impl ClassificationError {
    /// Whether the upstream service refused the call because of quota.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Llm(LlmError::RateLimited { .. })) || self.to_string().contains("429")
    }
}

/// Auto-reply delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Missing mail credentials: {0}")]
    MissingCredentials(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Email API rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Email API connection error: {0}")]
    Connection(String),

    #[error("SMTP error: {0}")]
    Smtp(String),
}

/// Lead log persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Recorder task failed: {0}")]
    Task(String),
}

/// Malformed inbound webhook payloads.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("No data received")]
    EmptyBody,

    #[error("Malformed JSON body: {0}")]
    MalformedBody(String),

    #[error("Missing email field")]
    MissingEmail,
}
