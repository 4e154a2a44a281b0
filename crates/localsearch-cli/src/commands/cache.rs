use anyhow::Result;
use serde_json::json;
use std::sync::Arc;

use crate::cli::{CacheCommands, OutputFormat};
use crate::output::json::print_json;
use localsearch_core::SearchCore;

pub fn run(core: Arc<SearchCore>, command: CacheCommands, format: OutputFormat) -> Result<()> {
    let cache = core.dispatcher.cache();
    let (action, count) = match command {
        CacheCommands::Stats => ("stats", cache.len()?),
        CacheCommands::Prune => ("prune", cache.prune()?),
        CacheCommands::Clear => ("clear", cache.clear()?),
    };

    if format.is_json() {
        return print_json(&json!({ "action": action, "count": count }));
    }

    match command {
        CacheCommands::Stats => println!("Cache holds {} entries", count),
        CacheCommands::Prune => println!("Removed {} expired entries", count),
        CacheCommands::Clear => println!("Removed {} entries", count),
    }
    Ok(())
}
