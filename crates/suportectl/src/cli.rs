//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap.
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Suporte.AI operator CLI
#[derive(Parser)]
#[command(name = "suportectl")]
#[command(about = "Suporte.AI - ticketing bridge operator tool", long_about = None)]
#[command(version = suporte_common::VERSION)]
pub struct Cli {
    /// Config file (overrides $SUPORTE_CONFIG and /etc/suporte/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output JSON only
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Classify a problem description without opening a ticket
    Classify {
        /// Free-text problem description
        text: Vec<String>,
    },

    /// Print the category taxonomy
    Taxonomy,

    /// Classify a problem description and open a ticket
    Ticket {
        /// Free-text problem description
        text: Vec<String>,
    },

    /// Inspect and provision backend ticket categories
    Categories {
        #[command(subcommand)]
        action: CategoryCommands,
    },
}

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List categories stored in the backend
    List,

    /// Compare backend categories with the local taxonomy
    Check,

    /// Create the categories the backend is missing
    Provision {
        /// Show what would be created
        #[arg(long)]
        dry_run: bool,
    },
}
