//! Suporte.AI Control - operator CLI for the ticketing bridge
//!
//! Classifies text offline, opens tickets directly against the backend and
//! keeps the backend's categories in lockstep with the taxonomy.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{CategoryCommands, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so --json output stays clean; quiet unless RUST_LOG is set
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Classify { text } => commands::handle_classify(config, &text.join(" "), cli.json),
        Commands::Taxonomy => commands::handle_taxonomy(config, cli.json),
        Commands::Ticket { text } => {
            commands::handle_ticket(config, &text.join(" "), cli.json).await
        }
        Commands::Categories { action } => match action {
            CategoryCommands::List => commands::handle_categories_list(config, cli.json).await,
            CategoryCommands::Check => commands::handle_categories_check(config, cli.json).await,
            CategoryCommands::Provision { dry_run } => {
                commands::handle_categories_provision(config, dry_run, cli.json).await
            }
        },
    }
}
