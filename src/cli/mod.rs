//! CLI module for recordfiles
//!
//! Provides command-line interface for:
//! - serve: Start the HTTP server
//! - token: Issue one access token and print it

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command, ScopeArg};
pub use commands::{issue_token, run, run_command, serve};
pub use config::{BackendConfig, Config, ScopeConfig, TableConfig};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_json;
