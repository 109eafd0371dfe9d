mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Courier -- browser-driven report delivery for API-less messaging clients.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Deliver a PDF report to the configured conversation
    Send {
        /// Path to the PDF artifact to deliver
        #[arg(long)]
        pdf: PathBuf,

        /// Report date in YYYY-MM-DD form, used for the caption and ledger
        #[arg(long)]
        date: String,

        /// Destination conversation label (overrides the configured one)
        #[arg(long)]
        to: Option<String>,

        /// Caption text (overrides the configured template)
        #[arg(long)]
        caption: Option<String>,

        /// Path to a courier.toml config file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check whether a report date is already recorded in the ledger
    Status {
        /// Report date in YYYY-MM-DD form
        #[arg(long)]
        date: String,

        /// Path to a courier.toml config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing with env filter (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            pdf,
            date,
            to,
            caption,
            config,
        } => commands::send::run(&pdf, &date, to.as_deref(), caption.as_deref(), config.as_deref()),
        Commands::Status { date, config } => commands::status::run(&date, config.as_deref()),
    }
}
