//! Configuration types.
//!
//! Built once in `main` and passed down by value; nothing reads the
//! environment after startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::channels::{
    MailConfig, ResendConfig, SenderIdentity, SmtpConfig, SmtpSecurity, TransportKind,
};
use crate::channels::resend::RESEND_API_URL;
use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};
use crate::pipeline::FallbackPolicy;
use crate::pipeline::recorder::resolve_log_path;

const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODEL: &str = "gemini-flash-latest";
const DEFAULT_SENDER_NAME: &str = "Equipo de Auditoría";
/// Resend's shared sender; works without a verified domain.
const DEFAULT_SENDER_ADDRESS: &str = "onboarding@resend.dev";
const DEFAULT_LOG_PATH: &str = "leads_log.csv";

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,
    pub llm: LlmConfig,
    pub fallback: FallbackPolicy,
    pub mail: MailConfig,
    pub sender: SenderIdentity,
    /// Resolved CSV path (already redirected to the temp dir if needed).
    pub log_path: PathBuf,
    /// Fixed recipient for the diagnostic test email; route disabled if unset.
    pub diagnostic_recipient: Option<String>,
    pub logging: LoggingConfig,
}

/// Tracing output settings.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for daily rolling log files, if any.
    pub dir: Option<PathBuf>,
}

impl AppConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or("PORT", get("PORT"), 5000)?;
        let listen_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "HOST".to_string(),
                    message: format!("{e}"),
                })?;

        let llm = LlmConfig {
            backend: LlmBackend::Gemini,
            api_key: get("GEMINI_API_KEY").map(SecretString::from),
            api_base: get("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            timeout: Duration::from_secs(parse_or("LLM_TIMEOUT_SECS", get("LLM_TIMEOUT_SECS"), 30)?),
        };

        let fallback = parse_or(
            "CLASSIFIER_FALLBACK",
            get("CLASSIFIER_FALLBACK"),
            FallbackPolicy::default(),
        )?;

        let mail_timeout =
            Duration::from_secs(parse_or("MAIL_TIMEOUT_SECS", get("MAIL_TIMEOUT_SECS"), 10)?);
        let transport = parse_or("MAIL_TRANSPORT", get("MAIL_TRANSPORT"), TransportKind::Resend)?;

        let smtp_port: u16 = parse_or("SMTP_PORT", get("SMTP_PORT"), 587)?;
        let smtp_security = parse_or(
            "SMTP_SECURITY",
            get("SMTP_SECURITY"),
            SmtpSecurity::for_port(smtp_port),
        )?;
        let smtp_user = get("SMTP_USER");

        let mail = MailConfig {
            transport,
            resend: ResendConfig {
                api_key: get("RESEND_API_KEY").map(SecretString::from),
                api_url: get("RESEND_API_URL").unwrap_or_else(|| RESEND_API_URL.to_string()),
                timeout: mail_timeout,
            },
            smtp: SmtpConfig {
                host: get("SMTP_HOST"),
                port: smtp_port,
                security: smtp_security,
                username: smtp_user.clone(),
                password: get("SMTP_PASSWORD").map(SecretString::from),
                timeout: mail_timeout,
            },
        };

        let sender = SenderIdentity {
            name: get("SENDER_NAME")
                .or_else(|| get("AUDITOR_NAME"))
                .unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string()),
            address: get("SENDER_ADDRESS")
                .or(smtp_user)
                .unwrap_or_else(|| DEFAULT_SENDER_ADDRESS.to_string()),
        };

        let configured_log = get("LEAD_LOG_PATH")
            .or_else(|| get("ARCH_SEGUIMIENTO"))
            .unwrap_or_else(|| DEFAULT_LOG_PATH.to_string());
        let log_path = resolve_log_path(&PathBuf::from(configured_log));

        let logging = LoggingConfig {
            level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            dir: get("LOG_DIR").map(PathBuf::from),
        };

        Ok(Self {
            listen_addr,
            llm,
            fallback,
            mail,
            sender,
            log_path,
            diagnostic_recipient: get("DIAGNOSTIC_RECIPIENT"),
            logging,
        })
    }
}

/// Parse an optional value, using `default` when unset.
fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}': {e}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.listen_addr.port(), 5000);
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.llm.model, "gemini-flash-latest");
        assert_eq!(config.fallback, FallbackPolicy::FailOpen);
        assert_eq!(config.mail.transport, TransportKind::Resend);
        assert_eq!(config.mail.resend.api_url, "https://api.resend.com/emails");
        assert_eq!(config.mail.resend.timeout, Duration::from_secs(10));
        assert_eq!(config.sender.name, "Equipo de Auditoría");
        assert_eq!(config.sender.address, "onboarding@resend.dev");
        assert!(config.diagnostic_recipient.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn values_are_read_and_trimmed() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("GEMINI_API_KEY", " gk-123 "),
            ("CLASSIFIER_FALLBACK", "conservative"),
            ("MAIL_TRANSPORT", "smtp"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_PORT", "465"),
            ("SMTP_USER", "auditor@example.com"),
            ("SMTP_PASSWORD", "secret"),
            ("AUDITOR_NAME", "Auditores SL"),
        ])
        .unwrap();

        assert_eq!(config.listen_addr.port(), 8080);
        assert_eq!(config.llm.api_key.as_ref().unwrap().expose_secret(), "gk-123");
        assert_eq!(config.fallback, FallbackPolicy::Conservative);
        assert_eq!(config.mail.transport, TransportKind::Smtp);
        assert_eq!(config.mail.smtp.security, SmtpSecurity::Implicit);
        assert_eq!(config.sender.name, "Auditores SL");
        // The SMTP login doubles as the sender address.
        assert_eq!(config.sender.address, "auditor@example.com");
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = config_from(&[("RESEND_API_KEY", ""), ("SENDER_NAME", "  ")]).unwrap();
        assert!(config.mail.resend.api_key.is_none());
        assert_eq!(config.sender.name, "Equipo de Auditoría");
    }

    #[test]
    fn explicit_security_overrides_port_default() {
        let config = config_from(&[("SMTP_PORT", "465"), ("SMTP_SECURITY", "starttls")]).unwrap();
        assert_eq!(config.mail.smtp.security, SmtpSecurity::StartTls);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));

        let err = config_from(&[("MAIL_TRANSPORT", "fax")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MAIL_TRANSPORT"));

        let err = config_from(&[("CLASSIFIER_FALLBACK", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn log_path_is_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        let config = config_from(&[("LEAD_LOG_PATH", path.to_str().unwrap())]).unwrap();
        assert_eq!(config.log_path, path);
    }
}
