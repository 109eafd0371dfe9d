//! `courier status`: ledger lookup for a report date.

use std::path::Path;

use anyhow::Context;

use courier_ledger::{FileSentStore, SentDateStore};

pub fn run(date: &str, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let report_date = super::parse_report_date(date)?;

    let store = FileSentStore::new(&config.ledger_path, config.ledger_max_entries);
    let sent = store
        .contains(report_date)
        .with_context(|| format!("failed to read ledger {}", config.ledger_path.display()))?;

    if sent {
        println!("{date}: delivered (recorded in {})", config.ledger_path.display());
    } else {
        println!("{date}: not delivered");
    }
    Ok(())
}
