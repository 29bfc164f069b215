//! SMTP transport via lettre.
//!
//! lettre's blocking `SmtpTransport` runs on the blocking pool; one
//! connection per message, closed after the send.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, Transport as _};
use secrecy::{ExposeSecret, SecretString};

use crate::channels::{OutgoingEmail, Transport};
use crate::error::DeliveryError;

/// Port that conventionally uses implicit TLS.
const IMPLICIT_TLS_PORT: u16 = 465;

/// How the connection to the relay is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Plaintext connect, then upgrade with STARTTLS.
    StartTls,
    /// TLS from the first byte.
    Implicit,
}

impl SmtpSecurity {
    /// Default for a port: implicit TLS on 465, STARTTLS elsewhere.
    pub fn for_port(port: u16) -> Self {
        if port == IMPLICIT_TLS_PORT {
            Self::Implicit
        } else {
            Self::StartTls
        }
    }
}

impl std::str::FromStr for SmtpSecurity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "starttls" => Ok(Self::StartTls),
            "implicit" | "tls" | "ssl" => Ok(Self::Implicit),
            other => Err(format!("unknown SMTP security '{other}' (expected starttls or implicit)")),
        }
    }
}

/// SMTP relay configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub security: SmtpSecurity,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub timeout: Duration,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 587,
            security: SmtpSecurity::StartTls,
            username: None,
            password: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Sends mail through an authenticated SMTP relay.
pub struct SmtpTransport {
    config: SmtpConfig,
}

impl SmtpTransport {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    fn name(&self) -> &str {
        "smtp"
    }

    fn is_configured(&self) -> bool {
        self.config.host.is_some() && self.config.username.is_some() && self.config.password.is_some()
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<(), DeliveryError> {
        let (Some(host), Some(username), Some(password)) = (
            self.config.host.clone(),
            self.config.username.clone(),
            self.config.password.as_ref(),
        ) else {
            return Err(DeliveryError::MissingCredentials(
                "SMTP_HOST, SMTP_USER and SMTP_PASSWORD must all be set".into(),
            ));
        };

        let message = build_message(email)?;
        let creds = Credentials::new(username, password.expose_secret().to_string());
        let port = self.config.port;
        let security = self.config.security;
        let timeout = self.config.timeout;

        tokio::task::spawn_blocking(move || {
            let builder = match security {
                SmtpSecurity::StartTls => lettre::SmtpTransport::starttls_relay(&host),
                SmtpSecurity::Implicit => lettre::SmtpTransport::relay(&host),
            }
            .map_err(|e| DeliveryError::Smtp(format!("SMTP relay error: {e}")))?;

            let transport = builder
                .port(port)
                .credentials(creds)
                .timeout(Some(timeout))
                .build();

            transport
                .send(&message)
                .map_err(|e| DeliveryError::Smtp(format!("SMTP send failed: {e}")))?;
            Ok::<_, DeliveryError>(())
        })
        .await
        .map_err(|e| DeliveryError::Smtp(format!("SMTP task failed: {e}")))??;

        tracing::info!(to = %email.to, "Email sent via SMTP");
        Ok(())
    }
}

/// Build the MIME message for an outgoing email.
fn build_message(email: &OutgoingEmail) -> Result<Message, DeliveryError> {
    let from_address: Address = email
        .from
        .address
        .parse()
        .map_err(|e| DeliveryError::InvalidAddress(format!("from '{}': {e}", email.from.address)))?;
    let to_address: Address = email
        .to
        .parse()
        .map_err(|e| DeliveryError::InvalidAddress(format!("to '{}': {e}", email.to)))?;

    Message::builder()
        .from(Mailbox::new(Some(email.from.name.clone()), from_address))
        .to(Mailbox::new(None, to_address))
        .subject(email.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(email.text.clone())
        .map_err(|e| DeliveryError::Smtp(format!("Failed to build email: {e}")))
}
