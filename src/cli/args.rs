//! CLI argument definitions using clap
//!
//! Commands:
//! - recordfiles serve --config <path>
//! - recordfiles token --config <path> --table <T> --id <R> --file <F>

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// recordfiles - scoped access tokens for files attached to table records
#[derive(Parser, Debug)]
#[command(name = "recordfiles")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./recordfiles.json")]
        config: PathBuf,
    },

    /// Issue one access token and print it as JSON
    Token {
        /// Path to configuration file
        #[arg(long, default_value = "./recordfiles.json")]
        config: PathBuf,

        /// Configured table the record belongs to
        #[arg(long)]
        table: String,

        /// Record id
        #[arg(long)]
        id: String,

        /// File name within the record
        #[arg(long)]
        file: String,

        /// Comma-separated permission names
        #[arg(long, default_value = "read")]
        permissions: String,

        /// Override the table's configured scope
        #[arg(long, value_enum)]
        scope: Option<ScopeArg>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeArg {
    Record,
    File,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
