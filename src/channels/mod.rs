//! Outbound email transports for the auto-reply.
//!
//! The notifier only sees the `Transport` trait. Which implementation backs
//! it is a deployment choice made in configuration.

pub mod resend;
pub mod smtp;

pub use resend::{ResendConfig, ResendTransport};
pub use smtp::{SmtpConfig, SmtpSecurity, SmtpTransport};

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;

use crate::error::DeliveryError;

/// Display name and address the auto-reply is sent from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderIdentity {
    pub name: String,
    pub address: String,
}

impl SenderIdentity {
    /// `Name <address>` form used in the `From` header.
    pub fn mailbox(&self) -> String {
        format!("{} <{}>", self.name, self.address)
    }
}

/// A fully composed plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: SenderIdentity,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// An email delivery mechanism.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name (e.g. "resend", "smtp").
    fn name(&self) -> &str;

    /// Whether the credentials needed to send are present.
    fn is_configured(&self) -> bool;

    /// Deliver one message. Missing credentials fail before any network I/O.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), DeliveryError>;
}

/// Which transport a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Resend,
    Smtp,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resend => "resend",
            Self::Smtp => "smtp",
        }
    }
}

impl std::str::FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "resend" | "api" | "http" => Ok(Self::Resend),
            "smtp" => Ok(Self::Smtp),
            other => Err(format!("unknown mail transport '{other}' (expected resend or smtp)")),
        }
    }
}

/// Mail settings for whichever transport is selected.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub transport: TransportKind,
    pub resend: ResendConfig,
    pub smtp: SmtpConfig,
}

impl MailConfig {
    /// The API key `/diagnostics` may show in masked form.
    ///
    /// Only a Resend key qualifies: it is a revocable token. An SMTP password
    /// is never returned.
    pub fn displayable_api_key(&self) -> Option<String> {
        match self.transport {
            TransportKind::Resend => self
                .resend
                .api_key
                .as_ref()
                .map(|key| key.expose_secret().to_string()),
            TransportKind::Smtp => None,
        }
    }
}

/// Build the configured transport.
pub fn create_transport(config: &MailConfig) -> Result<Arc<dyn Transport>, DeliveryError> {
    let transport: Arc<dyn Transport> = match config.transport {
        TransportKind::Resend => Arc::new(ResendTransport::new(config.resend.clone())?),
        TransportKind::Smtp => Arc::new(SmtpTransport::new(config.smtp.clone())),
    };
    tracing::info!(
        transport = transport.name(),
        configured = transport.is_configured(),
        "Mail transport ready"
    );
    Ok(transport)
}
