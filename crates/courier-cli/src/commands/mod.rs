pub mod send;
pub mod status;

use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use courier_types::CourierConfig;

/// Load configuration from an explicit file, or fall back to defaults plus
/// `COURIER_*` environment overrides.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<CourierConfig> {
    match path {
        Some(p) => CourierConfig::load(p)
            .with_context(|| format!("failed to load config from {}", p.display())),
        None => CourierConfig::from_env().context("invalid configuration from environment"),
    }
}

pub fn parse_report_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid report date {raw:?}, expected YYYY-MM-DD"))
}
