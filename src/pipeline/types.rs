//! Shared types for the lead pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Inbound lead ────────────────────────────────────────────────────

/// One contact-form submission.
///
/// Built at the intake boundary (webhook handler, smoke test) and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEvent {
    /// Sender display name.
    pub name: String,
    /// Reply-to address.
    pub email: String,
    pub subject: String,
    pub body: String,
}

impl ContactEvent {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

// ── Verdict ─────────────────────────────────────────────────────────

/// Lead interest category, highest first.
///
/// Serialized with the labels the classification prompt asks the model for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Lead bueno")]
    GoodLead,
    #[serde(rename = "Lead dudoso")]
    DoubtfulLead,
    #[serde(rename = "No relevante")]
    NotRelevant,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Self::GoodLead => "Lead bueno",
            Self::DoubtfulLead => "Lead dudoso",
            Self::NotRelevant => "No relevante",
        }
    }

    /// Only the highest category gets an auto-reply.
    pub fn warrants_reply(&self) -> bool {
        matches!(self, Self::GoodLead)
    }

    /// Everything except the lowest category is logged.
    pub fn is_recorded(&self) -> bool {
        !matches!(self, Self::NotRelevant)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        [Self::GoodLead, Self::DoubtfulLead, Self::NotRelevant]
            .into_iter()
            .find(|c| c.label().to_lowercase() == normalized)
            .ok_or_else(|| s.to_string())
    }
}

/// Follow-up priority attached to a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "Alta")]
    High,
    #[serde(rename = "Media")]
    Medium,
    #[serde(rename = "Baja")]
    Low,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "Alta",
            Self::Medium => "Media",
            Self::Low => "Baja",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        [Self::High, Self::Medium, Self::Low]
            .into_iter()
            .find(|p| p.label().to_lowercase() == normalized)
            .ok_or_else(|| s.to_string())
    }
}

/// The classifier's output for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub category: Category,
    pub priority: Priority,
    /// Free-text justification from the model, or the fallback reason.
    pub reason: String,
}

// ── Delivery ────────────────────────────────────────────────────────

/// Result of the auto-reply step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub attempted: bool,
    pub success: bool,
    pub error: Option<String>,
}

impl DeliveryOutcome {
    /// No reply was due.
    pub fn skipped() -> Self {
        Self::default()
    }

    pub fn delivered() -> Self {
        Self {
            attempted: true,
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            attempted: true,
            success: false,
            error: Some(error.into()),
        }
    }
}

// ── Report ──────────────────────────────────────────────────────────

/// What the pipeline did with one event. Returned to the webhook caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadReport {
    pub category: Category,
    pub priority: Priority,
    pub reason: String,
    pub email_sent: bool,
    pub email_attempted: bool,
    /// Empty when no send failed.
    pub email_error: String,
    pub logged: bool,
}

impl LeadReport {
    pub fn new(verdict: Verdict, delivery: DeliveryOutcome, logged: bool) -> Self {
        Self {
            category: verdict.category,
            priority: verdict.priority,
            reason: verdict.reason,
            email_sent: delivery.success,
            email_attempted: delivery.attempted,
            email_error: delivery.error.unwrap_or_default(),
            logged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_labels_case_insensitively() {
        assert_eq!("Lead bueno".parse::<Category>(), Ok(Category::GoodLead));
        assert_eq!("  lead DUDOSO ".parse::<Category>(), Ok(Category::DoubtfulLead));
        assert_eq!("No relevante".parse::<Category>(), Ok(Category::NotRelevant));
        assert!("Lead excelente".parse::<Category>().is_err());
    }

    #[test]
    fn priority_parses_labels() {
        assert_eq!("Alta".parse::<Priority>(), Ok(Priority::High));
        assert_eq!("media".parse::<Priority>(), Ok(Priority::Medium));
        assert_eq!("BAJA".parse::<Priority>(), Ok(Priority::Low));
        assert!("Urgente".parse::<Priority>().is_err());
    }

    #[test]
    fn category_routing_rules() {
        assert!(Category::GoodLead.warrants_reply());
        assert!(!Category::DoubtfulLead.warrants_reply());
        assert!(!Category::NotRelevant.warrants_reply());

        assert!(Category::GoodLead.is_recorded());
        assert!(Category::DoubtfulLead.is_recorded());
        assert!(!Category::NotRelevant.is_recorded());
    }

    #[test]
    fn report_serializes_labels() {
        let report = LeadReport::new(
            Verdict {
                category: Category::GoodLead,
                priority: Priority::High,
                reason: "pide presupuesto".into(),
            },
            DeliveryOutcome::failed("Email API rejected the message (422): bad from"),
            true,
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["category"], "Lead bueno");
        assert_eq!(json["priority"], "Alta");
        assert_eq!(json["email_sent"], false);
        assert_eq!(json["email_attempted"], true);
        assert!(json["email_error"].as_str().unwrap().contains("422"));
        assert_eq!(json["logged"], true);
    }

    #[test]
    fn skipped_delivery_is_not_attempted() {
        let outcome = DeliveryOutcome::skipped();
        assert!(!outcome.attempted);
        assert!(!outcome.success);
        assert!(outcome.error.is_none());
    }
}
