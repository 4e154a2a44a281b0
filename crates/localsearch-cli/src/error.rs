use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);

    let msg = err.to_string().to_lowercase();

    if msg.contains("directory not found") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Pass an existing directory, or set a default with:");
        eprintln!("  {} localsearch --search-root <dir> ...", "$".dimmed());
    }

    if msg.contains("requires ripgrep") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Install ripgrep and check detection with:");
        eprintln!("  {} localsearch backends", "$".dimmed());
    }

    if msg.contains("database") || msg.contains("cache") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Clear the search cache with:");
        eprintln!("  {} localsearch cache clear", "$".dimmed());
    }

    std::process::exit(1);
}
