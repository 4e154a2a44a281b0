mod cli;
mod commands;
mod completions;
mod config;
mod error;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::CliConfig;
use localsearch_core::{SearchConfig, SearchCore, paths};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() {
    if let Err(err) = run(Cli::parse()).await {
        error::handle_error(err);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Some(Commands::Completions { shell }) = cli.command {
        completions::generate_completions(shell);
        return Ok(());
    }

    // Stdout belongs to the MCP transport, so logs always go to a file.
    let _guard = init_logging(cli.verbose)?;

    let file_config = match &cli.config {
        Some(path) => CliConfig::load_from_path(Some(path.clone())),
        None => CliConfig::load(),
    };
    let search_config = effective_search_config(&cli, &file_config);
    let db_path = cli.db_path.clone().or(file_config.default.db_path);

    let core = Arc::new(SearchCore::new(search_config, db_path.as_deref())?);
    commands::run(core, cli.command.unwrap_or(Commands::Serve), cli.format).await
}

fn init_logging(verbose: bool) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(paths::logs_dir()?, "localsearch.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .init();

    Ok(guard)
}

/// Command-line flags override the config file.
fn effective_search_config(cli: &Cli, file_config: &CliConfig) -> SearchConfig {
    let mut config = file_config.search.clone();
    if let Some(root) = &cli.search_root {
        config.search_root = Some(root.clone());
    }
    if cli.fallback_only {
        config.prefer_fallback = true;
    }
    if cli.no_cache {
        config.cache_enabled = false;
    }
    config
}
