use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Output format for CLI commands
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

#[derive(Parser)]
#[command(name = "localsearch")]
#[command(version, about = "LocalSearch - Fast local file and content search over MCP")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory searched when a command names none (defaults to the working directory)
    #[arg(long, global = true, env = "LOCALSEARCH_ROOT")]
    pub search_root: Option<PathBuf>,

    /// Cache database path (defaults to ~/.localsearch/cache/search_cache.redb)
    #[arg(long, global = true, env = "LOCALSEARCH_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Configuration file (defaults to ~/.config/localsearch/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Ignore fd and rg even when installed
    #[arg(long, global = true)]
    pub fallback_only: bool,

    /// Disable the query cache for this invocation
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP server on stdio (default)
    Serve,

    /// Show which native search tools were detected
    Backends,

    /// Fuzzy search for files by name
    Files(FilesArgs),

    /// Search file contents for text
    Content(ContentArgs),

    /// Search file contents with a regular expression (requires rg)
    Regex(RegexArgs),

    /// Find files by name pattern, size and extension
    Find(FindArgs),

    /// Show metadata and a preview for a file
    Info {
        /// File to inspect
        path: String,
    },

    /// Query cache maintenance
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct FilesArgs {
    /// File name or partial name
    pub query: String,

    /// Directory to search in
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Restrict to these extensions (repeatable)
    #[arg(short = 't', long = "type")]
    pub file_types: Vec<String>,

    /// Maximum number of results
    #[arg(short, long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Args)]
pub struct ContentArgs {
    /// Text to search for
    pub query: String,

    /// Directory to search in
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Match case exactly
    #[arg(short = 's', long)]
    pub case_sensitive: bool,

    /// Match whole words only
    #[arg(short, long)]
    pub whole_word: bool,

    /// Glob restricting which files are searched
    #[arg(short = 'g', long = "glob", default_value = "**/*")]
    pub file_pattern: String,

    /// Maximum number of results
    #[arg(short, long, default_value_t = 50)]
    pub limit: usize,
}

#[derive(Args)]
pub struct RegexArgs {
    /// Regular expression
    pub pattern: String,

    /// Directory to search in
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Glob restricting which files are searched
    #[arg(short = 'g', long = "glob", default_value = "**/*")]
    pub file_pattern: String,

    /// Maximum number of results
    #[arg(short, long, default_value_t = 50)]
    pub limit: usize,
}

#[derive(Args)]
pub struct FindArgs {
    /// Directory to search in
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// File name glob
    #[arg(short, long, default_value = "*")]
    pub name: String,

    /// Minimum size in bytes
    #[arg(long)]
    pub min_size: Option<u64>,

    /// Maximum size in bytes
    #[arg(long)]
    pub max_size: Option<u64>,

    /// Restrict to these extensions (repeatable)
    #[arg(short = 't', long = "type")]
    pub file_types: Vec<String>,

    /// Maximum number of results
    #[arg(short, long, default_value_t = 100)]
    pub limit: usize,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show how many entries the cache holds
    Stats,
    /// Remove expired entries
    Prune,
    /// Remove every entry
    Clear,
}
