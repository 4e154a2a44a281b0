use anyhow::{Result, bail};
use std::sync::Arc;

use crate::cli::{ContentArgs, FilesArgs, FindArgs, OutputFormat, RegexArgs};
use crate::output::json::print_json;
use localsearch_core::dispatcher::{ContentQuery, FileQuery, FindQuery, RegexQuery};
use localsearch_core::format::{format_content_results, format_file_results, stat_results};
use localsearch_core::{SearchCore, SearchOutcome, ServedBy};

pub async fn files(core: Arc<SearchCore>, args: FilesArgs, format: OutputFormat) -> Result<()> {
    let outcome = core
        .dispatcher
        .search_files(FileQuery {
            query: args.query,
            directory: args.directory,
            file_types: args.file_types,
            limit: args.limit,
        })
        .await?;
    print_file_outcome(&outcome, format).await
}

pub async fn content(core: Arc<SearchCore>, args: ContentArgs, format: OutputFormat) -> Result<()> {
    let outcome = core
        .dispatcher
        .search_content(ContentQuery {
            query: args.query,
            directory: args.directory,
            case_sensitive: args.case_sensitive,
            whole_word: args.whole_word,
            file_pattern: Some(args.file_pattern),
            limit: args.limit,
        })
        .await?;
    print_content_outcome(&outcome, format)
}

pub async fn regex(core: Arc<SearchCore>, args: RegexArgs, format: OutputFormat) -> Result<()> {
    let outcome = core
        .dispatcher
        .search_regex(RegexQuery {
            pattern: args.pattern,
            directory: args.directory,
            file_pattern: Some(args.file_pattern),
            limit: args.limit,
        })
        .await?;

    if outcome.served_by == ServedBy::Unsupported {
        bail!(
            "{}",
            outcome
                .message
                .unwrap_or_else(|| "Regex search is unavailable".to_string())
        );
    }
    print_content_outcome(&outcome, format)
}

pub async fn find(core: Arc<SearchCore>, args: FindArgs, format: OutputFormat) -> Result<()> {
    let outcome = core
        .dispatcher
        .find_files(FindQuery {
            directory: args.directory,
            name_pattern: Some(args.name),
            min_size: args.min_size,
            max_size: args.max_size,
            file_types: args.file_types,
            limit: args.limit,
        })
        .await?;
    print_file_outcome(&outcome, format).await
}

async fn print_file_outcome(outcome: &SearchOutcome, format: OutputFormat) -> Result<()> {
    if format.is_json() {
        return print_json(outcome);
    }
    let stats = stat_results(&outcome.results).await;
    println!("{}", format_file_results(outcome, &stats).trim_end());
    Ok(())
}

fn print_content_outcome(outcome: &SearchOutcome, format: OutputFormat) -> Result<()> {
    if format.is_json() {
        return print_json(outcome);
    }
    println!("{}", format_content_results(outcome).trim_end());
    Ok(())
}
