//! Lead classifier — asks the LLM for a verdict on one contact event.
//!
//! `try_classify` reports every failure as a `ClassificationError`.
//! `classify` is the only place the fallback policy is applied, so an LLM
//! outage degrades the verdict instead of failing the request.

use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ClassificationError;
use crate::llm::provider::{ChatMessage, CompletionRequest, FinishReason, LlmProvider};
use crate::pipeline::types::{Category, ContactEvent, Priority, Verdict};

/// Max tokens for the classification call. Thinking tokens count toward
/// this limit, so it sits far above the size of the JSON verdict.
const CLASSIFY_MAX_TOKENS: u32 = 8192;

/// Temperature for classification (deterministic-ish).
const CLASSIFY_TEMPERATURE: f32 = 0.1;

/// Fallback reasons longer than this are cut.
const MAX_REASON_CHARS: usize = 100;

// ── Fallback policy ─────────────────────────────────────────────────

/// Verdict to use when classification fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Treat the lead as good: an outage never drops a real client.
    #[default]
    FailOpen,
    /// Treat the lead as doubtful: no auto-reply, still logged.
    Conservative,
}

impl FallbackPolicy {
    /// Build the degraded verdict for a classification failure.
    pub fn verdict_for(&self, error: &ClassificationError) -> Verdict {
        let (category, priority) = match self {
            Self::FailOpen => (Category::GoodLead, Priority::High),
            Self::Conservative => (Category::DoubtfulLead, Priority::Medium),
        };

        let reason = if error.is_rate_limited() {
            self.rate_limit_reason().to_string()
        } else {
            truncate_reason(&error.to_string(), MAX_REASON_CHARS)
        };

        Verdict {
            category,
            priority,
            reason,
        }
    }

    fn rate_limit_reason(&self) -> &'static str {
        match self {
            Self::FailOpen => {
                "Límite de mensajes temporales alcanzado (Cortesía de Google). \
                 Procesando como lead importante por defecto."
            }
            Self::Conservative => {
                "Límite de mensajes temporales alcanzado (Cortesía de Google). \
                 Procesando como lead dudoso por defecto."
            }
        }
    }
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail_open" | "fail-open" | "good" => Ok(Self::FailOpen),
            "conservative" | "doubtful" => Ok(Self::Conservative),
            other => Err(format!(
                "unknown fallback policy '{other}' (expected fail_open or conservative)"
            )),
        }
    }
}

// ── Classifier ──────────────────────────────────────────────────────

/// LLM-backed lead classifier.
pub struct Classifier {
    llm: Arc<dyn LlmProvider>,
    fallback: FallbackPolicy,
}

impl Classifier {
    pub fn new(llm: Arc<dyn LlmProvider>, fallback: FallbackPolicy) -> Self {
        Self { llm, fallback }
    }

    /// Classify an event, degrading to the fallback verdict on any error.
    pub async fn classify(&self, event: &ContactEvent) -> Verdict {
        match self.try_classify(event).await {
            Ok(verdict) => {
                info!(
                    sender = %event.name,
                    category = %verdict.category,
                    priority = %verdict.priority,
                    "Lead classified"
                );
                verdict
            }
            Err(e) => {
                let verdict = self.fallback.verdict_for(&e);
                warn!(
                    sender = %event.name,
                    error = %e,
                    fallback = ?self.fallback,
                    category = %verdict.category,
                    "Classification failed, using fallback verdict"
                );
                verdict
            }
        }
    }

    /// Classify an event, surfacing every failure.
    pub async fn try_classify(&self, event: &ContactEvent) -> Result<Verdict, ClassificationError> {
        let request = CompletionRequest::new(vec![ChatMessage::user(build_prompt(event))])
            .with_temperature(CLASSIFY_TEMPERATURE)
            .with_max_tokens(CLASSIFY_MAX_TOKENS);

        let response = self.llm.complete(request).await?;

        // A cut-off reply may still hold a prefix of a different label.
        match response.finish_reason {
            FinishReason::Length => Err(ClassificationError::Incomplete {
                cause: "the output token limit",
            }),
            FinishReason::Safety => Err(ClassificationError::Incomplete {
                cause: "the safety filter",
            }),
            FinishReason::Stop | FinishReason::Other => parse_verdict(&response.content),
        }
    }
}

// ── Prompt construction ─────────────────────────────────────────────

/// Build the classification prompt. The criteria text is product policy and
/// must stay word for word.
pub fn build_prompt(event: &ContactEvent) -> String {
    format!(
        "Eres un asistente experto para un auditor en España. Tu objetivo es clasificar el interés de un cliente potencial.\n\
         \n\
         Remitente: {sender}\n\
         Asunto: {subject}\n\
         Cuerpo: {body}\n\
         \n\
         Criterios de clasificación ESTRICTOS:\n\
         1) \"Lead bueno\" (prioridad alta): Cualquier solicitud de auditoría, revisión, consultoría ISO, presupuestos, o contacto directo de empresa. NO importa si faltan datos técnicos, si es un cliente potencial real, es un lead bueno.\n\
         2) \"Lead dudoso\" (prioridad media): Preguntas muy genéricas sobre el sector sin intención de contratación clara, o estudiantes.\n\
         3) \"No relevante\" (prioridad baja): Spam obvio, ofertas de trabajo (CVs), publicidad, o insultos.\n\
         \n\
         Responde ÚNICAMENTE en formato JSON con estas llaves:\n\
         \"clasificacion\": (Lead bueno / Lead dudoso / No relevante),\n\
         \"prioridad\": (Alta / Media / Baja),\n\
         \"razon\": (breve explicación de por qué lo has clasificado así)",
        sender = event.name,
        subject = event.subject,
        body = event.body,
    )
}

// ── Response parsing ────────────────────────────────────────────────

/// Raw verdict as the model writes it.
#[derive(Debug, Deserialize)]
struct VerdictResponse {
    #[serde(default = "default_category", alias = "clasificación")]
    clasificacion: String,
    #[serde(default = "default_priority")]
    prioridad: String,
    #[serde(default, alias = "razón")]
    razon: String,
}

fn default_category() -> String {
    Category::DoubtfulLead.label().to_string()
}

fn default_priority() -> String {
    Priority::Medium.label().to_string()
}

/// Parse the model's text into a `Verdict`.
pub fn parse_verdict(raw: &str) -> Result<Verdict, ClassificationError> {
    let json_str = extract_json_object(raw);
    let response: VerdictResponse = serde_json::from_str(&json_str)
        .map_err(|e| ClassificationError::Parse(format!("{e}")))?;

    let category = response
        .clasificacion
        .parse::<Category>()
        .map_err(|value| ClassificationError::UnknownLabel {
            field: "category",
            value,
        })?;
    let priority = response
        .prioridad
        .parse::<Priority>()
        .map_err(|value| ClassificationError::UnknownLabel {
            field: "priority",
            value,
        })?;

    Ok(Verdict {
        category,
        priority,
        reason: response.razon.trim().to_string(),
    })
}

/// Extract a JSON object from LLM output (handles markdown wrapping).
fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return trimmed.to_string();
    }

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}

/// Cut `text` to `max` characters, marking the cut with `...`.
fn truncate_reason(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
