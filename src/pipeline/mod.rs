//! Lead processing pipeline.
//!
//! Every contact event flows through:
//! 1. `Classifier::classify()` — LLM verdict, fallback on failure
//! 2. `Notifier::notify()` — canned auto-reply, good leads only
//! 3. `Recorder::record()` — CSV row, skipped for not-relevant leads
//!
//! `LeadProcessor` runs the three steps in order and builds the report.

pub mod classifier;
pub mod notifier;
pub mod processor;
pub mod recorder;
pub mod types;

pub use classifier::{Classifier, FallbackPolicy};
pub use notifier::Notifier;
pub use processor::LeadProcessor;
pub use recorder::Recorder;
pub use types::{Category, ContactEvent, DeliveryOutcome, LeadReport, Priority, Verdict};
