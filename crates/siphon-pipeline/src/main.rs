//! Siphon Pipeline - ingest and retention CLI

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use siphon_common::logging::{init_logging, LogConfig, LogLevel};
use siphon_pipeline::archiver::Archiver;
use siphon_pipeline::config::PipelineConfig;
use siphon_pipeline::models::Notification;
use siphon_pipeline::processor::Processor;
use siphon_pipeline::storage::{S3Store, StorageConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "siphon-pipeline")]
#[command(author, version, about = "Object-store ingest and retention pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Process a batch of file-arrival notifications
    Process {
        /// Path to the notification batch JSON (a bare `[{bucket, key}]`
        /// list or an S3-style event envelope)
        #[arg(short, long)]
        event: std::path::PathBuf,
    },

    /// Run one retention sweep over the processed bucket
    Sweep {
        /// Override the configured retention period
        #[arg(long)]
        retention_days: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Environment configuration first, CLI verbosity on top
    let mut log_config = LogConfig::from_env().unwrap_or_default();
    if cli.verbose {
        log_config.level = LogLevel::Debug;
    }
    log_config.log_file_prefix = "siphon-pipeline".to_string();
    init_logging(&log_config)?;

    let config = PipelineConfig::load()?;
    let store = S3Store::new(StorageConfig::from_env()?);

    match cli.command {
        Command::Process { event } => {
            let raw = std::fs::read_to_string(&event)?;
            let notifications = Notification::parse_batch(&raw)?;
            info!(
                batch_size = notifications.len(),
                "Processing notification batch"
            );

            let processor = Processor::new(store, config);
            let report = processor.handle_batch(notifications).await;

            println!("{}", serde_json::to_string_pretty(&report)?);
        },
        Command::Sweep { retention_days } => {
            let mut config = config;
            if let Some(days) = retention_days {
                config.retention_days = days;
                config.validate()?;
            }

            let archiver = Archiver::new(store, config);
            let report = archiver.sweep(Utc::now()).await?;

            println!("{}", serde_json::to_string_pretty(&report)?);
        },
    }

    info!("Done");
    Ok(())
}
