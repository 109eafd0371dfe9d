//! Browser-driven report delivery engine.
//!
//! Given a validated PDF artifact and a target conversation label, this
//! crate drives a headless browser session against a web messaging client
//! that exposes no formal API: establish an authenticated session, open the
//! conversation, attach the file with a caption, click send through an
//! unstable DOM, and verify -- with no server acknowledgement to lean on --
//! that the message actually left. A persisted ledger of delivered report
//! dates makes retries idempotent.
//!
//! Pipeline, in order:
//!
//! 1. [`validate::validate_pdf`] -- artifact sanity checks, no browser yet.
//! 2. [`session::SessionManager`] -- ready inbox or `SessionLoadTimeout`.
//! 3. [`conversation::ConversationLocator`] -- open the target conversation.
//! 4. [`attach::AttachmentPipeline`] -- inject the file, cascading fallbacks.
//! 5. [`compose::SendController`] -- best-effort caption, cascading clicks.
//! 6. [`verify::DeliveryVerifier`] -- multi-signal, stability-gated proof.
//! 7. [`orchestrate::DeliveryOrchestrator`] -- the whole attempt plus the
//!    ledger update.
//!
//! All waiting is sleep-and-recheck through [`poll::poll_until`]; all
//! fallback chains run through [`cascade::run_cascade`]; all DOM candidate
//! lists live in [`selectors::SelectorBook`] as data.

pub mod attach;
pub mod cascade;
pub mod compose;
pub mod conversation;
pub mod diagnostics;
pub mod error;
pub mod orchestrate;
pub mod poll;
pub mod selectors;
pub mod session;
pub mod validate;
pub mod verify;

pub use attach::{AttachStrategy, AttachmentResult};
pub use error::{ArtifactError, DeliveryError};
pub use orchestrate::{DeliveryOrchestrator, DeliveryOutcome};
pub use selectors::SelectorBook;
pub use session::SessionState;
pub use verify::{SignalKind, SignalTally};
