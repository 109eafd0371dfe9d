//! Persisted record of report dates already delivered.
//!
//! The ledger is the idempotency backstop for the delivery engine: a date is
//! recorded only after a send is verified, and a recorded date short-circuits
//! any later attempt for the same report. The on-disk format is deliberately
//! plain -- one ISO `YYYY-MM-DD` per line -- because the external scheduler's
//! shell wrappers read it too.
//!
//! No file locking is performed. One runner at a time is an operational
//! guarantee of the scheduler, not something this crate enforces.

pub mod store;

pub use store::{open_default, FileSentStore, LedgerError, MemorySentStore, SentDateStore};
