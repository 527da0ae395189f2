//! doclog CLI
//!
//! Command-line tools for doclog stores.
//!
//! # Commands
//!
//! - `inspect` - Display store statistics
//! - `verify` - Verify journal framing and chain integrity
//! - `export` - Export documents to a sync directory
//! - `dump` - List documents in commit order

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// doclog command-line store tools.
#[derive(Parser)]
#[command(name = "doclog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display store statistics
    Inspect {
        /// Show document counts per day
        #[arg(short, long)]
        days: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Verify journal framing and chain integrity
    Verify,

    /// Export documents to a sync directory
    Export {
        /// Sync directory
        dir: PathBuf,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// List documents in commit order
    Dump {
        /// Maximum number of documents to list
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { days, format } => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path, days, &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Store path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Export { dir, compact } => {
            let path = cli.path.ok_or("Store path required for export")?;
            commands::export::run(&path, &dir, compact)?;
        }
        Commands::Dump { limit, format } => {
            let path = cli.path.ok_or("Store path required for dump")?;
            commands::dump::run(&path, limit, &format)?;
        }
        Commands::Version => {
            println!("doclog CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("doclog core v{}", doclog_core::VERSION);
        }
    }

    Ok(())
}
