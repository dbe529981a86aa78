//! Suporte.AI bridge daemon
//!
//! Receives problem reports over HTTP, classifies them and opens tickets in
//! the helpdesk, one backend session per request.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use suporte_common::config::SuporteConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "suported", version, about = "Suporte.AI ticketing bridge daemon")]
struct Args {
    /// Config file (defaults to $SUPORTE_CONFIG, then /etc/suporte/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("Suporte.AI daemon v{} starting", suporte_common::VERSION);

    let mut config =
        SuporteConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    suported::server::run(&config).await
}
