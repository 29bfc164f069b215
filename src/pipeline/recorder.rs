//! Lead log recorder — appends one CSV row per recorded lead.
//!
//! There is no cross-request locking: two concurrent appends may interleave.
//! The form is low-volume and each row is written with a single flush.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::RecordError;
use crate::pipeline::types::{ContactEvent, DeliveryOutcome, Verdict};

/// Status column value for freshly logged leads.
pub const STATUS_PENDING: &str = "Pending";

/// File name used when the configured path has none.
const DEFAULT_FILE_NAME: &str = "leads_log.csv";

/// One row of the lead log. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Priority")]
    pub priority: String,
    #[serde(rename = "Reason")]
    pub reason: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Reply Sent")]
    pub reply_sent: String,
}

impl LogRecord {
    pub fn new(event: &ContactEvent, verdict: &Verdict, delivery: &DeliveryOutcome) -> Self {
        Self {
            date: Local::now().format("%Y-%m-%d %H:%M").to_string(),
            name: event.name.clone(),
            email: event.email.clone(),
            subject: event.subject.clone(),
            category: verdict.category.label().to_string(),
            priority: verdict.priority.label().to_string(),
            reason: verdict.reason.clone(),
            status: STATUS_PENDING.to_string(),
            reply_sent: if delivery.success { "Yes" } else { "No" }.to_string(),
        }
    }
}

/// Appends lead rows to a CSV file.
#[derive(Debug, Clone)]
pub struct Recorder {
    path: PathBuf,
}

impl Recorder {
    /// `path` should already be resolved with [`resolve_log_path`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Log the lead unless it is not relevant. Returns whether a row was
    /// written; failures are logged and swallowed.
    pub async fn record(
        &self,
        event: &ContactEvent,
        verdict: &Verdict,
        delivery: &DeliveryOutcome,
    ) -> bool {
        if !verdict.category.is_recorded() {
            debug!(sender = %event.name, "Lead not relevant, skipping log");
            return false;
        }

        let record = LogRecord::new(event, verdict, delivery);
        let recorder = self.clone();
        let result = tokio::task::spawn_blocking(move || recorder.append(&record))
            .await
            .map_err(|e| RecordError::Task(e.to_string()))
            .and_then(|r| r);

        match result {
            Ok(()) => {
                debug!(path = %self.path.display(), sender = %event.name, "Lead logged");
                true
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Could not write lead to log"
                );
                false
            }
        }
    }

    /// Append one row, writing the header first if the file is new or empty.
    pub fn append(&self, record: &LogRecord) -> Result<(), RecordError> {
        let needs_header = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }
}

/// Resolve the log path once at startup.
///
/// If the configured directory is not writable, the same file name is used
/// under the OS temporary directory.
pub fn resolve_log_path(configured: &Path) -> PathBuf {
    let dir = match configured.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if is_dir_writable(&dir) {
        return configured.to_path_buf();
    }

    let file_name = configured
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.into());
    let fallback = std::env::temp_dir().join(file_name);
    warn!(
        configured = %configured.display(),
        fallback = %fallback.display(),
        "Log directory not writable, using temporary directory"
    );
    fallback
}

/// Probe a directory by creating and removing a uniquely named file.
fn is_dir_writable(dir: &Path) -> bool {
    let probe = dir.join(format!(".lead-intake-probe-{}", uuid::Uuid::new_v4()));
    match OpenOptions::new().write(true).create_new(true).open(&probe) {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{Category, Priority};

    fn event() -> ContactEvent {
        ContactEvent::new(
            "Empresa Test SA",
            "test@empresa.com",
            "Auditoría obligatoria urgente",
            "necesitamos auditar nuestras cuentas de 2025",
        )
    }

    fn verdict(category: Category) -> Verdict {
        Verdict {
            category,
            priority: Priority::High,
            reason: "Solicita auditoría, con coma".into(),
        }
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[tokio::test]
    async fn appends_header_once_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        let recorder = Recorder::new(&path);

        for _ in 0..3 {
            assert!(
                recorder
                    .record(&event(), &verdict(Category::GoodLead), &DeliveryOutcome::delivered())
                    .await
            );
        }

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[0],
            vec![
                "Date", "Name", "Email", "Subject", "Category", "Priority", "Reason", "Status",
                "Reply Sent"
            ]
        );
        for row in &rows[1..] {
            assert_eq!(row.len(), 9);
            assert_eq!(row[1], "Empresa Test SA");
            assert_eq!(row[2], "test@empresa.com");
            assert_eq!(row[3], "Auditoría obligatoria urgente");
            assert_eq!(row[4], "Lead bueno");
            assert_eq!(row[5], "Alta");
            assert_eq!(row[6], "Solicita auditoría, con coma");
            assert_eq!(row[7], "Pending");
            assert_eq!(row[8], "Yes");
        }
    }

    #[tokio::test]
    async fn not_relevant_is_never_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        let recorder = Recorder::new(&path);

        let written = recorder
            .record(&event(), &verdict(Category::NotRelevant), &DeliveryOutcome::skipped())
            .await;
        assert!(!written);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn failed_delivery_marks_reply_not_sent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        let recorder = Recorder::new(&path);

        recorder
            .record(
                &event(),
                &verdict(Category::GoodLead),
                &DeliveryOutcome::failed("connection refused"),
            )
            .await;

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][6], "Solicita auditoría, con coma");
        assert_eq!(rows[1][8], "No");
    }

    #[tokio::test]
    async fn write_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for append.
        let recorder = Recorder::new(dir.path());

        let written = recorder
            .record(&event(), &verdict(Category::DoubtfulLead), &DeliveryOutcome::skipped())
            .await;
        assert!(!written);
    }

    #[test]
    fn existing_empty_file_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        std::fs::write(&path, "").unwrap();

        let recorder = Recorder::new(&path);
        recorder
            .append(&LogRecord::new(
                &event(),
                &verdict(Category::DoubtfulLead),
                &DeliveryOutcome::skipped(),
            ))
            .unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "Date");
        assert_eq!(rows[1][4], "Lead dudoso");
        assert_eq!(rows[1][8], "No");
    }

    #[test]
    fn writable_directory_keeps_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        assert_eq!(resolve_log_path(&path), path);
    }

    #[test]
    fn missing_directory_falls_back_to_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist").join("leads.csv");
        let resolved = resolve_log_path(&path);
        assert_eq!(resolved, std::env::temp_dir().join("leads.csv"));
    }
}
