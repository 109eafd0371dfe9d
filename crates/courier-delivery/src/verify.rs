//! Post-send verification.
//!
//! The messaging client gives no acknowledgement contract, and any single
//! DOM signal can be a stale leftover from an earlier, unrelated send. So
//! verification is a state machine over *multiple* independent signals:
//! enough distinct kinds must be observed, the observed set must hold still
//! across consecutive polls, and an explicit error indicator fails the whole
//! attempt immediately.

use std::collections::BTreeSet;

use courier_browser::UiDriver;
use courier_types::VerifierConfig;
use tracing::{debug, info, warn};

use crate::diagnostics::Diagnostics;
use crate::error::DeliveryError;
use crate::selectors::SelectorBook;

/// One independently-observable piece of evidence that the send completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignalKind {
    /// The upload preview dialog is gone.
    DialogClosed,
    /// More outgoing message bubbles than before the send.
    MessageCountIncreased,
    /// A delivery checkmark on the latest outgoing message.
    DeliveryCheckmark,
    /// A document indicator inside the latest outgoing message.
    DocumentIndicator,
    /// The caption (report date) present in the latest outgoing message.
    CaptionDatePresent,
}

/// Phases a verification run moves through. Terminal outcomes are the
/// `Result` of [`DeliveryVerifier::verify`], not phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyPhase {
    AwaitingDialogClose,
    AwaitingProcessing,
    CheckingSignals,
}

/// Accumulates signal observations and decides when the evidence is strong
/// enough. Pure state, no I/O.
#[derive(Debug)]
pub struct SignalTally {
    min_distinct: usize,
    required_stable: u32,
    seen: BTreeSet<SignalKind>,
    previous: BTreeSet<SignalKind>,
    stable_run: u32,
}

impl SignalTally {
    pub fn new(min_distinct: usize, required_stable: u32) -> Self {
        Self {
            min_distinct: min_distinct.max(1),
            required_stable: required_stable.max(1),
            seen: BTreeSet::new(),
            previous: BTreeSet::new(),
            stable_run: 0,
        }
    }

    /// Record one poll's observed signal set. Returns `true` once the
    /// distinct-kind threshold is met and the set has been stable for the
    /// required number of consecutive polls.
    pub fn observe(&mut self, observed: BTreeSet<SignalKind>) -> bool {
        if observed == self.previous {
            self.stable_run += 1;
        } else {
            self.stable_run = 1;
            self.previous = observed.clone();
        }
        self.seen.extend(observed);

        self.seen.len() >= self.min_distinct && self.stable_run >= self.required_stable
    }

    /// Distinct signal kinds observed so far.
    pub fn seen(&self) -> &BTreeSet<SignalKind> {
        &self.seen
    }
}

/// Multi-signal delivery verifier.
pub struct DeliveryVerifier<'a, U: UiDriver> {
    ui: &'a U,
    selectors: &'a SelectorBook,
    config: &'a VerifierConfig,
    diagnostics: &'a Diagnostics,
}

impl<'a, U: UiDriver> DeliveryVerifier<'a, U> {
    pub fn new(
        ui: &'a U,
        selectors: &'a SelectorBook,
        config: &'a VerifierConfig,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        Self {
            ui,
            selectors,
            config,
            diagnostics,
        }
    }

    /// Run the full verification state machine for a send that was just
    /// clicked. `baseline_outgoing` is the outgoing-message count captured
    /// before the send; `expected_date` is the ISO date the caption carries;
    /// `artifact_name` is the uploaded file's name.
    pub async fn verify(
        &self,
        baseline_outgoing: usize,
        expected_date: &str,
        artifact_name: &str,
    ) -> Result<(), DeliveryError> {
        let mut phase = VerifyPhase::AwaitingDialogClose;
        debug!(?phase, "verification started");

        self.await_dialog_close().await?;

        phase = VerifyPhase::AwaitingProcessing;
        debug!(?phase, wait = ?self.config.processing_wait(), "letting the client process the send");
        tokio::time::sleep(self.config.processing_wait()).await;

        phase = VerifyPhase::CheckingSignals;
        debug!(?phase, "collecting verification signals");
        self.check_signals(baseline_outgoing, expected_date, artifact_name)
            .await?;

        info!("send verified");
        Ok(())
    }

    /// Phase 1: the upload preview dialog must close. A dialog stuck open
    /// means the send never left the preview.
    async fn await_dialog_close(&self) -> Result<(), DeliveryError> {
        let deadline = tokio::time::Instant::now() + self.config.dialog_close_timeout();
        loop {
            if !self.any_dialog_visible().await? {
                debug!("upload dialog closed");
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                self.diagnostics.screenshot(self.ui, "dialog_stuck").await;
                return Err(DeliveryError::VerificationFailed {
                    reason: format!(
                        "upload dialog stuck open after {:?}",
                        self.config.dialog_close_timeout()
                    ),
                });
            }
            tokio::time::sleep(self.config.dialog_poll_interval()).await;
        }
    }

    /// Phase 3: accumulate signals until the tally passes, an error
    /// indicator appears, or the loop bound expires.
    async fn check_signals(
        &self,
        baseline_outgoing: usize,
        expected_date: &str,
        artifact_name: &str,
    ) -> Result<(), DeliveryError> {
        let mut tally = SignalTally::new(
            self.config.min_distinct_signals,
            self.config.required_stable_polls,
        );
        let deadline = tokio::time::Instant::now() + self.config.signal_timeout();

        loop {
            // An explicit error on the latest outgoing message trumps any
            // amount of positive evidence.
            if let Some(error_sel) = self
                .ui
                .find_first_visible(&SelectorBook::as_refs(&self.selectors.error_indicators))
                .await?
            {
                self.diagnostics.screenshot(self.ui, "send_error").await;
                return Err(DeliveryError::VerificationFailed {
                    reason: format!("error indicator present: {error_sel}"),
                });
            }

            let observed = self
                .collect_signals(baseline_outgoing, expected_date, artifact_name)
                .await?;
            debug!(signals = ?observed, "verification poll");

            if tally.observe(observed) {
                debug!(seen = ?tally.seen(), "signal threshold met");
                self.diagnostics.screenshot(self.ui, "send_verified").await;
                return Ok(());
            }

            if tokio::time::Instant::now() >= deadline {
                warn!(seen = ?tally.seen(), "verification signals insufficient or unstable");
                self.diagnostics.screenshot(self.ui, "verification_failed").await;
                self.diagnostics.html_dump(self.ui, "verification_failed").await;
                return Err(DeliveryError::VerificationFailed {
                    reason: format!(
                        "insufficient or unstable verification signals (saw {:?}, need {} distinct, stable for {} polls)",
                        tally.seen(),
                        self.config.min_distinct_signals,
                        self.config.required_stable_polls
                    ),
                });
            }
            tokio::time::sleep(self.config.signal_poll_interval()).await;
        }
    }

    async fn any_dialog_visible(&self) -> Result<bool, DeliveryError> {
        Ok(self
            .ui
            .find_first_visible(&SelectorBook::as_refs(&self.selectors.upload_dialogs))
            .await?
            .is_some())
    }

    /// Gather the signal set observable right now.
    async fn collect_signals(
        &self,
        baseline_outgoing: usize,
        expected_date: &str,
        artifact_name: &str,
    ) -> Result<BTreeSet<SignalKind>, DeliveryError> {
        let mut observed = BTreeSet::new();

        if !self.any_dialog_visible().await? {
            observed.insert(SignalKind::DialogClosed);
        }

        let outgoing = self
            .ui
            .count(&self.selectors.outgoing_messages)
            .await
            .unwrap_or(0);
        if outgoing > baseline_outgoing {
            observed.insert(SignalKind::MessageCountIncreased);
        }

        if self
            .ui
            .find_first_visible(&SelectorBook::as_refs(&self.selectors.checkmarks))
            .await?
            .is_some()
        {
            observed.insert(SignalKind::DeliveryCheckmark);
        }

        let last_text = self
            .ui
            .inner_text(&self.selectors.last_outgoing_message)
            .await
            .unwrap_or(None);

        let has_document_icon = self
            .ui
            .find_first_visible(&SelectorBook::as_refs(&self.selectors.document_indicators))
            .await?
            .is_some();
        let has_document_text = last_text
            .as_deref()
            .map(|t| t.contains(artifact_name) || t.contains("PDF"))
            .unwrap_or(false);
        if has_document_icon || has_document_text {
            observed.insert(SignalKind::DocumentIndicator);
        }

        if last_text
            .as_deref()
            .map(|t| t.contains(expected_date))
            .unwrap_or(false)
        {
            observed.insert(SignalKind::CaptionDatePresent);
        }

        Ok(observed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(kinds: &[SignalKind]) -> BTreeSet<SignalKind> {
        kinds.iter().copied().collect()
    }

    #[test]
    fn two_kinds_never_verify() {
        let mut tally = SignalTally::new(3, 2);
        let two = set(&[SignalKind::DialogClosed, SignalKind::DeliveryCheckmark]);
        for _ in 0..10 {
            assert!(!tally.observe(two.clone()));
        }
        assert_eq!(tally.seen().len(), 2);
    }

    #[test]
    fn third_stable_kind_flips_to_verified() {
        let mut tally = SignalTally::new(3, 2);
        let two = set(&[SignalKind::DialogClosed, SignalKind::DeliveryCheckmark]);
        assert!(!tally.observe(two.clone()));
        assert!(!tally.observe(two));

        let three = set(&[
            SignalKind::DialogClosed,
            SignalKind::DeliveryCheckmark,
            SignalKind::CaptionDatePresent,
        ]);
        // First observation of the new set resets stability.
        assert!(!tally.observe(three.clone()));
        assert!(tally.observe(three));
    }

    #[test]
    fn changing_set_resets_stability() {
        let mut tally = SignalTally::new(3, 3);
        let a = set(&[
            SignalKind::DialogClosed,
            SignalKind::MessageCountIncreased,
            SignalKind::DocumentIndicator,
        ]);
        let b = set(&[SignalKind::DialogClosed, SignalKind::MessageCountIncreased]);
        assert!(!tally.observe(a.clone()));
        assert!(!tally.observe(a.clone()));
        // Flicker: the set shrinks, stability restarts even though three
        // distinct kinds have been seen cumulatively.
        assert!(!tally.observe(b));
        assert!(!tally.observe(a.clone()));
        assert!(!tally.observe(a.clone()));
        assert!(tally.observe(a));
    }

    #[test]
    fn distinct_kinds_accumulate_across_polls() {
        let mut tally = SignalTally::new(3, 1);
        assert!(!tally.observe(set(&[SignalKind::DialogClosed])));
        assert!(!tally.observe(set(&[SignalKind::MessageCountIncreased])));
        // Third kind arrives and the (stable-for-1) gate is already open.
        assert!(tally.observe(set(&[SignalKind::DeliveryCheckmark])));
        assert_eq!(tally.seen().len(), 3);
    }

    #[test]
    fn thresholds_are_clamped_to_at_least_one() {
        let mut tally = SignalTally::new(0, 0);
        assert!(tally.observe(set(&[SignalKind::DialogClosed])));
    }
}
