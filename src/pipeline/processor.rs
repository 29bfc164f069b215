//! Lead processor — runs one contact event through the pipeline.
//!
//! Flow:
//! 1. Classifier → verdict (falls back, never fails)
//! 2. Notifier → only for good leads
//! 3. Recorder → every lead except the not-relevant ones

use tracing::info;

use crate::pipeline::classifier::Classifier;
use crate::pipeline::notifier::Notifier;
use crate::pipeline::recorder::Recorder;
use crate::pipeline::types::{ContactEvent, DeliveryOutcome, LeadReport};

/// Orchestrates classifier, notifier and recorder for one event at a time.
pub struct LeadProcessor {
    classifier: Classifier,
    notifier: Notifier,
    recorder: Recorder,
}

impl LeadProcessor {
    pub fn new(classifier: Classifier, notifier: Notifier, recorder: Recorder) -> Self {
        Self {
            classifier,
            notifier,
            recorder,
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Process a single contact event.
    pub async fn process(&self, event: ContactEvent) -> LeadReport {
        info!(sender = %event.name, email = %event.email, "Processing contact");

        let verdict = self.classifier.classify(&event).await;

        let delivery = if verdict.category.warrants_reply() {
            self.notifier.notify(&event.email, &event.name).await
        } else {
            DeliveryOutcome::skipped()
        };

        let logged = self.recorder.record(&event, &verdict, &delivery).await;

        info!(
            sender = %event.name,
            category = %verdict.category,
            email_sent = delivery.success,
            logged,
            "Contact processed"
        );

        LeadReport::new(verdict, delivery, logged)
    }
}
