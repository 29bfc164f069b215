//! LLM integration for lead classification.
//!
//! Supports:
//! - **Gemini**: `generateContent` over REST via reqwest
//!
//! Callers depend on the `LlmProvider` trait only, so tests can swap in a
//! stub provider.

pub mod gemini;
pub mod provider;

pub use gemini::GeminiProvider;
pub use provider::*;

use std::sync::Arc;
use std::time::Duration;

use crate::error::LlmError;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Gemini,
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    /// `None` keeps the service running; every call then fails and the
    /// classifier falls back.
    pub api_key: Option<secrecy::SecretString>,
    pub api_base: String,
    pub model: String,
    pub timeout: Duration,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.backend {
        LlmBackend::Gemini => {
            let provider = GeminiProvider::new(
                config.api_key.clone(),
                config.api_base.clone(),
                config.model.clone(),
                config.timeout,
            )?;
            tracing::info!(
                model = %config.model,
                key_present = config.api_key.is_some(),
                "Using Gemini"
            );
            Ok(Arc::new(provider))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider_without_key_still_constructs() {
        // A missing key only fails at request time.
        let config = LlmConfig {
            backend: LlmBackend::Gemini,
            api_key: None,
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-flash-latest".to_string(),
            timeout: Duration::from_secs(30),
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "gemini-flash-latest");
    }
}
