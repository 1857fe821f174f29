//! CLI argument definitions using clap
//!
//! Commands:
//! - captureline sync --config <path>
//! - captureline ingest --config <path>
//! - captureline query --config <path>
//! - captureline checkpoint --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// captureline - checkpointed capture ingestion and paginated queries
#[derive(Parser, Debug)]
#[command(name = "captureline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one ingestion cycle and print its report
    Sync {
        /// Path to configuration file
        #[arg(long, default_value = "./captureline.json")]
        config: PathBuf,
    },

    /// Run the ingestion polling loop until interrupted
    Ingest {
        /// Path to configuration file
        #[arg(long, default_value = "./captureline.json")]
        config: PathBuf,
    },

    /// Read request parameters from stdin and print one page
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./captureline.json")]
        config: PathBuf,
    },

    /// Print the persisted checkpoint
    Checkpoint {
        /// Path to configuration file
        #[arg(long, default_value = "./captureline.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
