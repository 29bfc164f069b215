//! Resend transactional-email API transport.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::channels::{OutgoingEmail, Transport};
use crate::error::DeliveryError;

/// Default Resend send endpoint.
pub const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Resend transport configuration.
#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: Option<SecretString>,
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for ResendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: RESEND_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Sends mail through the Resend HTTP API.
pub struct ResendTransport {
    config: ResendConfig,
    http: reqwest::Client,
}

impl ResendTransport {
    pub fn new(config: ResendConfig) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DeliveryError::Connection(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }
}

/// Request body for `POST /emails`.
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: String,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

/// Error body returned on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ResendErrorBody {
    message: Option<String>,
}

#[async_trait]
impl Transport for ResendTransport {
    fn name(&self) -> &str {
        "resend"
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<(), DeliveryError> {
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            DeliveryError::MissingCredentials("RESEND_API_KEY is not configured".into())
        })?;

        let body = SendEmailRequest {
            from: email.from.mailbox(),
            to: [email.to.as_str()],
            subject: &email.subject,
            text: &email.text,
        };

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| DeliveryError::Connection(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(to = %email.to, status = status.as_u16(), "Email sent via Resend");
            return Ok(());
        }

        let message = response
            .json::<ResendErrorBody>()
            .await
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| "unknown error".to_string());

        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::SenderIdentity;

    fn sample_email() -> OutgoingEmail {
        OutgoingEmail {
            from: SenderIdentity {
                name: "Equipo de Auditoría".into(),
                address: "onboarding@resend.dev".into(),
            },
            to: "test@empresa.com".into(),
            subject: "Re: Solicitud de información - Auditoría".into(),
            text: "Hola".into(),
        }
    }

    #[test]
    fn request_body_shape() {
        let email = sample_email();
        let body = SendEmailRequest {
            from: email.from.mailbox(),
            to: [email.to.as_str()],
            subject: &email.subject,
            text: &email.text,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["from"], "Equipo de Auditoría <onboarding@resend.dev>");
        assert_eq!(json["to"], serde_json::json!(["test@empresa.com"]));
        assert_eq!(json["subject"], "Re: Solicitud de información - Auditoría");
        assert_eq!(json["text"], "Hola");
    }

    #[tokio::test]
    async fn missing_key_is_a_precondition_failure() {
        let transport = ResendTransport::new(ResendConfig {
            // Any request here would surface as a Connection error instead.
            api_url: "http://127.0.0.1:9/emails".into(),
            ..ResendConfig::default()
        })
        .unwrap();
        assert!(!transport.is_configured());

        let err = transport.send(&sample_email()).await.unwrap_err();
        assert!(matches!(err, DeliveryError::MissingCredentials(_)));
    }
}
