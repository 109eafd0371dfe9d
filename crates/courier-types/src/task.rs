//! The unit of work consumed by the delivery orchestrator.

use std::path::PathBuf;

use chrono::NaiveDate;

/// One scheduled delivery: send `artifact_path` to the conversation labeled
/// `recipient_label` with `caption_text`, tracked in the idempotency ledger
/// under `report_date`.
///
/// Created once per run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryTask {
    /// Absolute or relative path to the PDF artifact.
    pub artifact_path: PathBuf,
    /// Display label of the destination conversation.
    pub recipient_label: String,
    /// Caption typed under the attachment.
    pub caption_text: String,
    /// Report date used for idempotency tracking.
    pub report_date: NaiveDate,
}

impl DeliveryTask {
    pub fn new(
        artifact_path: impl Into<PathBuf>,
        recipient_label: impl Into<String>,
        caption_text: impl Into<String>,
        report_date: NaiveDate,
    ) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            recipient_label: recipient_label.into(),
            caption_text: caption_text.into(),
            report_date,
        }
    }

    /// File name of the artifact, used in verification and log lines.
    pub fn artifact_file_name(&self) -> String {
        self.artifact_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The report date in the `YYYY-MM-DD` form the ledger and caption use.
    pub fn date_string(&self) -> String {
        self.report_date.format("%Y-%m-%d").to_string()
    }
}
