use std::process::ExitCode;

use clap::Parser;
use stowage_core::app::StoreBuilder;
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, ephemeral_backend_warning};

mod cli;
mod commands;

/// ログは stderr へ（stdout は JSON 出力専用）
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let args = Args::parse();
    let config = args.storage_config()?;
    tracing::debug!(?config, "loaded storage config");
    if let Some(warning) = ephemeral_backend_warning(&config) {
        tracing::warn!(backend = %config.backend, "{warning}");
    }

    let storage = StoreBuilder::new(config).build()?;
    commands::run(args.command, storage).await
}
