//! One generic sleep-and-recheck primitive.
//!
//! Every bounded wait in the delivery flow is a `(interval, timeout, probe)`
//! triple consumed by [`poll_until`], instead of a hand-rolled loop per call
//! site. The probe runs immediately, then once per interval until it yields
//! a value or the deadline passes.

use std::future::Future;
use std::time::Duration;

/// Result of a bounded poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The probe produced a value before the deadline.
    Completed(T),
    /// The deadline passed with the probe still empty-handed.
    TimedOut,
}

impl<T> PollOutcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            PollOutcome::Completed(value) => Some(value),
            PollOutcome::TimedOut => None,
        }
    }
}

/// Run `probe` every `interval` until it returns `Some` or `timeout`
/// elapses. The probe always runs at least once, so a zero timeout still
/// gets one observation.
///
/// Probe errors propagate immediately; a failing probe is a broken page, not
/// a reason to keep polling.
pub async fn poll_until<T, E, F, Fut>(
    interval: Duration,
    timeout: Duration,
    mut probe: F,
) -> Result<PollOutcome<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        if let Some(value) = probe().await? {
            return Ok(PollOutcome::Completed(value));
        }
        if tokio::time::Instant::now() >= deadline {
            return Ok(PollOutcome::TimedOut);
        }
        tokio::time::sleep(interval).await;
    }
}
