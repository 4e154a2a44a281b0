use anyhow::Result;
use std::sync::Arc;

use crate::cli::OutputFormat;
use crate::output::json::print_json;
use localsearch_core::SearchCore;
use localsearch_core::format::format_file_info;

pub async fn run(core: Arc<SearchCore>, path: &str, format: OutputFormat) -> Result<()> {
    let info = core.dispatcher.get_file_info(path).await?;

    if format.is_json() {
        return print_json(&info);
    }

    print!("{}", format_file_info(&info));
    Ok(())
}
