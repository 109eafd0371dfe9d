//! One delivery attempt, end to end.

use courier_browser::UiDriver;
use courier_ledger::SentDateStore;
use courier_types::{CourierConfig, DeliveryTask};
use tracing::{info, warn};

use crate::attach::{AttachStrategy, AttachmentPipeline};
use crate::compose::SendController;
use crate::conversation::ConversationLocator;
use crate::diagnostics::Diagnostics;
use crate::error::DeliveryError;
use crate::selectors::SelectorBook;
use crate::session::SessionManager;
use crate::validate::validate_pdf;
use crate::verify::DeliveryVerifier;

/// How a delivery attempt concluded successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The artifact was sent and verified; the date is now in the ledger.
    Delivered { strategy_used: AttachStrategy },
    /// The ledger already contained the report date; nothing was done.
    SkippedAlreadySent,
}

/// Sequences validation, session, locate, attach, caption/send, and verify
/// for one task against an already-connected page.
///
/// The orchestrator performs no internal retries: the fallback cascades
/// inside each stage are the retry policy, and any stage failure propagates
/// typed and unchanged so the external scheduler can apply its own policy.
/// The ledger is only ever written after a verified send.
pub struct DeliveryOrchestrator<'a, U: UiDriver> {
    ui: &'a U,
    config: &'a CourierConfig,
    selectors: SelectorBook,
    diagnostics: Diagnostics,
}

impl<'a, U: UiDriver> DeliveryOrchestrator<'a, U> {
    pub fn new(ui: &'a U, config: &'a CourierConfig) -> Self {
        Self {
            ui,
            config,
            selectors: SelectorBook::default(),
            diagnostics: Diagnostics::new(&config.diagnostics_dir),
        }
    }

    /// Replace the default selector book (for clients with drifted DOMs).
    pub fn with_selectors(mut self, selectors: SelectorBook) -> Self {
        self.selectors = selectors;
        self
    }

    /// Run one delivery attempt.
    pub async fn deliver<S: SentDateStore>(
        &self,
        store: &mut S,
        task: &DeliveryTask,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        let date = task.date_string();

        // Idempotency short-circuit: a recorded date means a prior run
        // already verified this report, so a retry must be a no-op. A
        // ledger read failure is treated as "not sent" -- resending beats
        // silently dropping a report.
        match store.contains(task.report_date) {
            Ok(true) => {
                info!(date, "report date already in ledger, skipping delivery");
                return Ok(DeliveryOutcome::SkippedAlreadySent);
            }
            Ok(false) => {}
            Err(e) => {
                warn!(date, error = %e, "could not read ledger, assuming not sent");
            }
        }

        validate_pdf(&task.artifact_path)?;

        let session = SessionManager::new(
            self.ui,
            &self.selectors,
            &self.config.session,
            &self.diagnostics,
        );
        session.establish(&self.config.entry_url).await?;

        let locator = ConversationLocator::new(
            self.ui,
            &self.selectors,
            &self.config.locator,
            &self.diagnostics,
        );
        locator.open(&task.recipient_label).await?;

        // Captured before the send so "message count increased" means *this*
        // send, not a leftover.
        let baseline_outgoing = self
            .ui
            .count(&self.selectors.outgoing_messages)
            .await
            .unwrap_or(0);

        let attach = AttachmentPipeline::new(
            self.ui,
            &self.selectors,
            &self.config.attach,
            &self.diagnostics,
        );
        let attachment = attach.attach(&task.artifact_path).await?;

        let sender = SendController::new(
            self.ui,
            &self.selectors,
            &self.config.send,
            &self.diagnostics,
        );
        sender.type_caption(&task.caption_text).await?;
        sender.send().await?;

        let verifier = DeliveryVerifier::new(
            self.ui,
            &self.selectors,
            &self.config.verifier,
            &self.diagnostics,
        );
        verifier
            .verify(baseline_outgoing, &date, &task.artifact_file_name())
            .await?;

        // Losing the dedupe record is less harmful than reporting a
        // verified send as failed, so a ledger write error is swallowed.
        if let Err(e) = store.add(task.report_date) {
            warn!(date, error = %e, "verified send could not be recorded in ledger");
        }

        info!(
            date,
            recipient = %task.recipient_label,
            strategy = ?attachment.strategy_used,
            "delivery complete"
        );
        Ok(DeliveryOutcome::Delivered {
            strategy_used: attachment.strategy_used,
        })
    }
}
