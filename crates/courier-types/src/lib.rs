//! Shared types for the courier delivery engine.
//!
//! [`CourierConfig`] is the top-level configuration loaded from
//! `courier.toml`, controlling the browser profile, ledger location,
//! diagnostics output, and every timing/threshold knob used by the delivery
//! state machines. [`DeliveryTask`] is the immutable description of one
//! scheduled delivery.

pub mod config;
pub mod task;

pub use config::{
    AttachConfig, ConfigError, CourierConfig, LocatorConfig, SendConfig, SessionConfig,
    VerifierConfig,
};
pub use task::DeliveryTask;
