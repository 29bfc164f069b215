//! Webhook and diagnostic endpoints.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::channels::OutgoingEmail;
use crate::error::IntakeError;
use crate::pipeline::{ContactEvent, LeadProcessor};

/// Name used when the form omits `nombre`.
const DEFAULT_SENDER_NAME: &str = "Desconocido";

/// Subject used when the form omits `asunto`.
const DEFAULT_SUBJECT: &str = "Contacto desde la web";

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<LeadProcessor>,
    /// API key shown masked on `/diagnostics`. Never an SMTP password.
    pub api_key: Option<String>,
    /// Fixed recipient of `/diagnostics/test-email`; route answers 404 if unset.
    pub diagnostic_recipient: Option<String>,
}

/// Build the Axum router.
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .route("/diagnostics", get(diagnostics))
        .route("/diagnostics/test-email", post(test_email))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "lead-intake"
    }))
}

// ── Webhook ─────────────────────────────────────────────────────────────

/// Contact form body as posted by the website.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub nombre: Option<String>,
    pub email: Option<String>,
    pub asunto: Option<String>,
    pub mensaje: Option<String>,
    pub cuerpo: Option<String>,
}

impl ContactForm {
    /// Parse a raw request body.
    pub fn parse(body: &[u8]) -> Result<Self, IntakeError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(IntakeError::EmptyBody);
        }
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| IntakeError::MalformedBody(e.to_string()))?;
        if !value.is_object() {
            return Err(IntakeError::MalformedBody("expected a JSON object".into()));
        }
        serde_json::from_value(value).map_err(|e| IntakeError::MalformedBody(e.to_string()))
    }

    /// Normalize into a `ContactEvent`, applying the form defaults.
    pub fn into_event(self) -> Result<ContactEvent, IntakeError> {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let email = non_blank(self.email).ok_or(IntakeError::MissingEmail)?;
        Ok(ContactEvent {
            name: non_blank(self.nombre).unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string()),
            email: email.trim().to_string(),
            subject: non_blank(self.asunto).unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            body: non_blank(self.mensaje)
                .or_else(|| non_blank(self.cuerpo))
                .unwrap_or_default(),
        })
    }
}

/// POST /webhook
///
/// 400 on an empty or malformed body, or a missing `email`; otherwise runs
/// the pipeline and returns its report.
async fn webhook(State(state): State<AppState>, body: Bytes) -> Response {
    let event = match ContactForm::parse(&body).and_then(ContactForm::into_event) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Rejected webhook payload");
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
                .into_response();
        }
    };

    // Run on its own task so a panic becomes a 500 instead of a dropped connection.
    let processor = Arc::clone(&state.processor);
    match tokio::spawn(async move { processor.process(event).await }).await {
        Ok(report) => Json(json!({
            "status": "success",
            "report": report,
            "message": "Contact processed"
        }))
        .into_response(),
        Err(e) => {
            error!(error = %e, "Lead processing task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error",
                    "detail": e.to_string()
                })),
            )
                .into_response()
        }
    }
}

// ── Diagnostics ─────────────────────────────────────────────────────────

/// GET /diagnostics
///
/// Reports which transport is active and whether its credential is present,
/// without revealing it.
async fn diagnostics(State(state): State<AppState>) -> impl IntoResponse {
    let notifier = state.processor.notifier();
    let transport = notifier.transport();

    Json(json!({
        "status": "diagnostic",
        "version": env!("CARGO_PKG_VERSION"),
        "transport": {
            "name": transport.name(),
            "credential_present": transport.is_configured(),
            "api_key_masked": state.api_key.as_deref().map(mask_secret),
        },
        "sender": notifier.sender().mailbox(),
        "log_path": state.processor.recorder().path().display().to_string(),
        "test_email_enabled": state.diagnostic_recipient.is_some(),
    }))
}

/// POST /diagnostics/test-email
///
/// Sends a probe through the live transport to the configured recipient.
async fn test_email(State(state): State<AppState>) -> Response {
    let Some(recipient) = state.diagnostic_recipient.clone() else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "DIAGNOSTIC_RECIPIENT is not configured" })),
        )
            .into_response();
    };

    let notifier = state.processor.notifier();
    let email = OutgoingEmail {
        from: notifier.sender().clone(),
        to: recipient.clone(),
        subject: format!("Diagnostic email v{}", env!("CARGO_PKG_VERSION")),
        text: format!(
            "If you receive this, the lead intake server can send email to {recipient}."
        ),
    };

    match notifier.transport().send(&email).await {
        Ok(()) => {
            info!(to = %recipient, "Diagnostic email sent");
            Json(json!({ "status": "sent", "to": recipient })).into_response()
        }
        Err(e) => {
            warn!(to = %recipient, error = %e, "Diagnostic email failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "status": "failed", "to": recipient, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Mask a key as `abcdef...wxyz`. Short values are fully hidden.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
