//! CLI command implementations

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::file_storage::{AccessToken, FileDetails, Permissions, TokenRequest};
use crate::http_server::{HttpServer, StorageState};
use crate::observability::{init_logging, Event, LogFormat};

use super::args::{Cli, Command, ScopeArg};
use super::config::{Config, ScopeConfig};
use super::errors::{CliError, CliResult};
use super::io::write_json;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    init_logging(if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    });
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config } => serve(&config),
        Command::Token {
            config,
            table,
            id,
            file,
            permissions,
            scope,
        } => {
            let config = load_config(&config)?;
            let permissions = Permissions::parse_names(&permissions)?;
            let token = runtime()?.block_on(issue_token(
                &config,
                &table,
                &id,
                &file,
                permissions,
                scope,
            ))?;
            write_json(&token)
        }
    }
}

fn load_config(path: &Path) -> CliResult<Config> {
    let config = Config::load(path)?;
    info!(
        event = Event::ConfigLoaded.as_str(),
        path = %path.display(),
        tables = config.tables.len()
    );
    Ok(config)
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}

/// Start the HTTP server for every configured table
pub fn serve(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let state = Arc::new(StorageState::new(config.services()?));
    let server = HttpServer::new(config.server.clone(), state);

    runtime()?.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Issue one token for `file` of record `id` in `table`
pub async fn issue_token(
    config: &Config,
    table: &str,
    id: &str,
    file: &str,
    permissions: Permissions,
    scope: Option<ScopeArg>,
) -> CliResult<AccessToken> {
    let table = config.table(table)?;
    let provider = config.provider(config.blob_client())?;

    let mut service = config.service(table, provider)?;
    if let Some(scope) = scope {
        let scope = match scope {
            ScopeArg::Record => ScopeConfig::Record,
            ScopeArg::File => ScopeConfig::File,
        };
        service = service.with_scope_policy(scope.policy());
    }

    let target = FileDetails::target(&table.name, id, file)?;
    let request = TokenRequest::new(permissions, target.into());
    Ok(service.issue_token(id, &request, None).await?)
}
