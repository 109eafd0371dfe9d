//! `courier send`: one delivery attempt, browser lifecycle included.

use std::path::Path;

use anyhow::Context;
use tracing::info;

use courier_browser::{BrowserSession, CdpUi, PageDriver};
use courier_delivery::{AttachStrategy, DeliveryOrchestrator, DeliveryOutcome};
use courier_ledger::FileSentStore;
use courier_types::DeliveryTask;

pub fn run(
    pdf: &Path,
    date: &str,
    to: Option<&str>,
    caption: Option<&str>,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let report_date = super::parse_report_date(date)?;

    let recipient = match to {
        Some(label) => label.to_string(),
        None => config.recipient_label.clone(),
    };
    if recipient.is_empty() {
        anyhow::bail!(
            "no destination conversation: pass --to or set recipient_label / COURIER_RECIPIENT"
        );
    }

    let caption = match caption {
        Some(text) => text.to_string(),
        None => config.caption_for(date),
    };
    let task = DeliveryTask::new(pdf, recipient, caption, report_date);

    let mut store = FileSentStore::new(&config.ledger_path, config.ledger_max_entries);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let outcome = rt.block_on(deliver(&config, &mut store, &task))?;

    match outcome {
        DeliveryOutcome::Delivered { strategy_used } => {
            println!(
                "Delivered {} to {:?} ({})",
                task.artifact_file_name(),
                task.recipient_label,
                strategy_name(strategy_used)
            );
        }
        DeliveryOutcome::SkippedAlreadySent => {
            println!(
                "Report for {} already recorded in {}, nothing to do",
                task.date_string(),
                config.ledger_path.display()
            );
        }
    }
    Ok(())
}

/// Launch the browser, attach a driver, run the attempt, and always tear the
/// browser down before reporting the result.
async fn deliver(
    config: &courier_types::CourierConfig,
    store: &mut FileSentStore,
    task: &DeliveryTask,
) -> anyhow::Result<DeliveryOutcome> {
    let session = BrowserSession::launch(
        config.chrome_binary.as_deref(),
        &config.profile_dir,
        config.devtools_port,
    )
    .await
    .context("failed to launch browser")?;

    let result = async {
        let driver = PageDriver::connect(session.ws_url())
            .await
            .context("failed to attach to browser page")?;
        let ui = CdpUi::new(driver);

        info!(date = %task.date_string(), recipient = %task.recipient_label, "starting delivery");
        DeliveryOrchestrator::new(&ui, config)
            .deliver(store, task)
            .await
            .context("delivery failed")
    }
    .await;

    session.close().await;
    result
}

fn strategy_name(strategy: AttachStrategy) -> &'static str {
    match strategy {
        AttachStrategy::FileChooserViaMenu => "document menu",
        AttachStrategy::DirectInput => "direct file input",
        AttachStrategy::MenuPositionFallback => "positional menu entry",
    }
}
