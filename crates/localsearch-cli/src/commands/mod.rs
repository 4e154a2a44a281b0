pub mod backends;
pub mod cache;
pub mod info;
pub mod search;
pub mod serve;

use anyhow::Result;
use std::sync::Arc;

use crate::cli::{Commands, OutputFormat};
use localsearch_core::SearchCore;

pub async fn run(core: Arc<SearchCore>, command: Commands, format: OutputFormat) -> Result<()> {
    match command {
        Commands::Serve => serve::run(core).await,
        Commands::Backends => backends::run(core, format),
        Commands::Files(args) => search::files(core, args, format).await,
        Commands::Content(args) => search::content(core, args, format).await,
        Commands::Regex(args) => search::regex(core, args, format).await,
        Commands::Find(args) => search::find(core, args, format).await,
        Commands::Info { path } => info::run(core, &path, format).await,
        Commands::Cache { command } => cache::run(core, command, format),
        // Handled before the core is opened.
        Commands::Completions { .. } => Ok(()),
    }
}
