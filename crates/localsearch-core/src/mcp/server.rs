//! MCP server implementation for LocalSearch
//!
//! This module exposes file-name, content and metadata search over the MCP
//! stdio transport so that AI assistants can explore a local tree.

use crate::SearchCore;
use crate::dispatcher::{ContentQuery, FileQuery, FindQuery, RegexQuery};
use crate::format::{
    format_content_results, format_file_info, format_file_results, format_watch_list,
    format_watch_outcome, stat_results,
};
use localsearch_tools::SearchError;
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::tool::schema_for_type,
    model::{
        CallToolRequestParams, CallToolResult, Content, ErrorCode, Implementation, JsonObject,
        ListToolsResult, PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
    },
    schemars::{self, JsonSchema},
    service::{RequestContext, RoleServer},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{stdin, stdout};

/// LocalSearch MCP Server
///
/// Exposes search, find, file info and watch registration via MCP protocol.
#[derive(Clone)]
pub struct LocalSearchMcpServer {
    core: Arc<SearchCore>,
}

impl LocalSearchMcpServer {
    /// Create a new MCP server over the given core
    pub fn new(core: Arc<SearchCore>) -> Self {
        Self { core }
    }

    /// Run the MCP server using stdio transport
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!("Starting LocalSearch MCP server...");
        let server = self.serve(stdio()).await?;
        tracing::info!("MCP server initialized, waiting for requests...");
        server.waiting().await?;
        Ok(())
    }
}

/// Create stdio transport for MCP communication
fn stdio() -> (tokio::io::Stdin, tokio::io::Stdout) {
    (stdin(), stdout())
}

// ============================================================================
// Tool Parameter Types
// ============================================================================

fn default_files_limit() -> u32 {
    20
}

fn default_content_limit() -> u32 {
    50
}

fn default_find_limit() -> u32 {
    100
}

fn default_file_pattern() -> String {
    "**/*".to_string()
}

fn default_name_pattern() -> String {
    "*".to_string()
}

fn default_recursive() -> bool {
    true
}

/// Parameters for search_files tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchFilesParams {
    /// Search query (file name or partial name)
    pub query: String,
    /// Directory to search in (defaults to the configured search root)
    #[serde(default)]
    pub directory: Option<String>,
    /// Maximum number of results
    #[serde(default = "default_files_limit")]
    pub limit: u32,
    /// File extensions to filter (e.g. ["py", "js"])
    #[serde(default)]
    pub file_types: Vec<String>,
}

/// Parameters for search_content tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchContentParams {
    /// Text to search for
    pub query: String,
    /// Directory to search in (defaults to the configured search root)
    #[serde(default)]
    pub directory: Option<String>,
    /// Case sensitive search
    #[serde(default)]
    pub case_sensitive: bool,
    /// Match whole words only
    #[serde(default)]
    pub whole_word: bool,
    /// Glob restricting which files are searched (e.g. "*.py")
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,
    /// Maximum number of results
    #[serde(default = "default_content_limit")]
    pub limit: u32,
}

/// Parameters for search_regex tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchRegexParams {
    /// Regular expression pattern
    pub pattern: String,
    /// Directory to search in (defaults to the configured search root)
    #[serde(default)]
    pub directory: Option<String>,
    /// Glob restricting which files are searched
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,
    /// Maximum number of results
    #[serde(default = "default_content_limit")]
    pub limit: u32,
}

/// Parameters for find_files tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FindFilesParams {
    /// Directory to search in (defaults to the configured search root)
    #[serde(default)]
    pub directory: Option<String>,
    /// File name glob (e.g. "*.log")
    #[serde(default = "default_name_pattern")]
    pub name_pattern: String,
    /// Minimum file size in bytes
    #[serde(default)]
    pub min_size: Option<u64>,
    /// Maximum file size in bytes
    #[serde(default)]
    pub max_size: Option<u64>,
    /// File extensions to filter
    #[serde(default)]
    pub file_types: Vec<String>,
    /// Maximum number of results
    #[serde(default = "default_find_limit")]
    pub limit: u32,
}

/// Parameters for get_file_info tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetFileInfoParams {
    /// Path to the file (relative paths resolve against the search root)
    pub file_path: String,
}

/// Parameters for watch_directory tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WatchDirectoryParams {
    /// Directory to watch
    pub directory: String,
    /// Watch subdirectories as well
    #[serde(default = "default_recursive")]
    pub recursive: bool,
}

/// Parameters for unwatch_directory tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UnwatchDirectoryParams {
    /// Directory to stop watching
    pub directory: String,
}

/// Empty parameters for tools that take no input
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct EmptyParams {}

impl From<SearchFilesParams> for FileQuery {
    fn from(params: SearchFilesParams) -> Self {
        FileQuery {
            query: params.query,
            directory: params.directory.map(PathBuf::from),
            file_types: params.file_types,
            limit: params.limit as usize,
        }
    }
}

impl From<SearchContentParams> for ContentQuery {
    fn from(params: SearchContentParams) -> Self {
        ContentQuery {
            query: params.query,
            directory: params.directory.map(PathBuf::from),
            case_sensitive: params.case_sensitive,
            whole_word: params.whole_word,
            file_pattern: Some(params.file_pattern),
            limit: params.limit as usize,
        }
    }
}

impl From<SearchRegexParams> for RegexQuery {
    fn from(params: SearchRegexParams) -> Self {
        RegexQuery {
            pattern: params.pattern,
            directory: params.directory.map(PathBuf::from),
            file_pattern: Some(params.file_pattern),
            limit: params.limit as usize,
        }
    }
}

impl From<FindFilesParams> for FindQuery {
    fn from(params: FindFilesParams) -> Self {
        FindQuery {
            directory: params.directory.map(PathBuf::from),
            name_pattern: Some(params.name_pattern),
            min_size: params.min_size,
            max_size: params.max_size,
            file_types: params.file_types,
            limit: params.limit as usize,
        }
    }
}

// ============================================================================
// Tool Dispatch
// ============================================================================

/// A tool invocation resolved from its wire name and arguments.
#[derive(Debug)]
pub enum ToolCall {
    SearchFiles(SearchFilesParams),
    SearchContent(SearchContentParams),
    SearchRegex(SearchRegexParams),
    FindFiles(FindFilesParams),
    GetFileInfo(GetFileInfoParams),
    WatchDirectory(WatchDirectoryParams),
    UnwatchDirectory(UnwatchDirectoryParams),
    ListWatchedDirectories,
}

impl ToolCall {
    /// Resolve `name` once. Unknown names are a protocol error, malformed
    /// arguments are invalid params.
    pub fn parse(name: &str, arguments: Option<JsonObject>) -> Result<Self, McpError> {
        let call = match name {
            "search_files" => ToolCall::SearchFiles(parse_params(arguments)?),
            "search_content" => ToolCall::SearchContent(parse_params(arguments)?),
            "search_regex" => ToolCall::SearchRegex(parse_params(arguments)?),
            "find_files" => ToolCall::FindFiles(parse_params(arguments)?),
            "get_file_info" => ToolCall::GetFileInfo(parse_params(arguments)?),
            "watch_directory" => ToolCall::WatchDirectory(parse_params(arguments)?),
            "unwatch_directory" => ToolCall::UnwatchDirectory(parse_params(arguments)?),
            "list_watched_directories" => ToolCall::ListWatchedDirectories,
            other => {
                return Err(McpError::new(
                    ErrorCode::METHOD_NOT_FOUND,
                    format!("Unknown tool: {}", other),
                    None,
                ));
            }
        };
        Ok(call)
    }
}

fn parse_params<T: DeserializeOwned>(arguments: Option<JsonObject>) -> Result<T, McpError> {
    serde_json::from_value(Value::Object(arguments.unwrap_or_default()))
        .map_err(|e| McpError::invalid_params(format!("Invalid parameters: {}", e), None))
}

// ============================================================================
// Tool Handlers
// ============================================================================

impl LocalSearchMcpServer {
    async fn dispatch(&self, call: ToolCall) -> Result<String, String> {
        match call {
            ToolCall::SearchFiles(params) => self.handle_search_files(params).await,
            ToolCall::SearchContent(params) => self.handle_search_content(params).await,
            ToolCall::SearchRegex(params) => self.handle_search_regex(params).await,
            ToolCall::FindFiles(params) => self.handle_find_files(params).await,
            ToolCall::GetFileInfo(params) => self.handle_get_file_info(params).await,
            ToolCall::WatchDirectory(params) => self.handle_watch_directory(params),
            ToolCall::UnwatchDirectory(params) => self.handle_unwatch_directory(params),
            ToolCall::ListWatchedDirectories => Ok(format_watch_list(&self.core.watches.list())),
        }
    }

    async fn handle_search_files(&self, params: SearchFilesParams) -> Result<String, String> {
        let outcome = self
            .core
            .dispatcher
            .search_files(params.into())
            .await
            .map_err(|e| format!("Search failed: {}", e))?;
        let stats = stat_results(&outcome.results).await;
        Ok(format_file_results(&outcome, &stats))
    }

    async fn handle_search_content(&self, params: SearchContentParams) -> Result<String, String> {
        let outcome = self
            .core
            .dispatcher
            .search_content(params.into())
            .await
            .map_err(|e| format!("Search failed: {}", e))?;
        Ok(format_content_results(&outcome))
    }

    async fn handle_search_regex(&self, params: SearchRegexParams) -> Result<String, String> {
        let outcome = self
            .core
            .dispatcher
            .search_regex(params.into())
            .await
            .map_err(|e| format!("Regex search failed: {}", e))?;
        Ok(format_content_results(&outcome))
    }

    async fn handle_find_files(&self, params: FindFilesParams) -> Result<String, String> {
        let outcome = self
            .core
            .dispatcher
            .find_files(params.into())
            .await
            .map_err(|e| format!("Find failed: {}", e))?;
        let stats = stat_results(&outcome.results).await;
        Ok(format_file_results(&outcome, &stats))
    }

    async fn handle_get_file_info(&self, params: GetFileInfoParams) -> Result<String, String> {
        match self.core.dispatcher.get_file_info(&params.file_path).await {
            Ok(info) => Ok(format_file_info(&info)),
            Err(SearchError::NotFound(_)) => Err(format!("File not found: {}", params.file_path)),
            Err(e) => Err(format!("Error getting file info: {}", e)),
        }
    }

    fn handle_watch_directory(&self, params: WatchDirectoryParams) -> Result<String, String> {
        let directory = self.resolve_watch_path(&params.directory);
        self.core
            .watches
            .register(&directory, params.recursive)
            .map(|outcome| format_watch_outcome(&outcome))
            .map_err(|e| match e {
                SearchError::InvalidInput(_) => format!("Directory not found: {}", params.directory),
                other => format!("Error watching directory: {}", other),
            })
    }

    fn handle_unwatch_directory(&self, params: UnwatchDirectoryParams) -> Result<String, String> {
        let directory = self.resolve_watch_path(&params.directory);
        if self.core.watches.unregister(&directory) {
            Ok(format!("Stopped watching directory: {}", params.directory))
        } else {
            Err(format!("Not watching: {}", params.directory))
        }
    }

    fn resolve_watch_path(&self, directory: &str) -> PathBuf {
        let path = PathBuf::from(directory);
        match &self.core.dispatcher.config().search_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }
}

impl ServerHandler for LocalSearchMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "localsearch".to_string(),
                title: Some("LocalSearch MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "LocalSearch MCP Server - Fast local file and content search. \
                Use search_files for fuzzy file-name search, search_content for text search, \
                search_regex for regular expressions (requires ripgrep), find_files to filter \
                by name, size and type, and get_file_info for metadata and a content preview."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = vec![
            Tool::new(
                "search_files",
                "Search for files by name using fuzzy matching. Uses fd when installed, otherwise an in-process scan.",
                schema_for_type::<SearchFilesParams>(),
            ),
            Tool::new(
                "search_content",
                "Search for text inside files. Uses ripgrep when installed, otherwise a line-by-line scan.",
                schema_for_type::<SearchContentParams>(),
            ),
            Tool::new(
                "search_regex",
                "Search file contents with a regular expression. Requires ripgrep (rg).",
                schema_for_type::<SearchRegexParams>(),
            ),
            Tool::new(
                "find_files",
                "Find files by name pattern, size range and extension. Results are never cached.",
                schema_for_type::<FindFilesParams>(),
            ),
            Tool::new(
                "get_file_info",
                "Get size, timestamps, MIME type, permissions and a short preview for a file.",
                schema_for_type::<GetFileInfoParams>(),
            ),
            Tool::new(
                "watch_directory",
                "Register a directory as watched.",
                schema_for_type::<WatchDirectoryParams>(),
            ),
            Tool::new(
                "unwatch_directory",
                "Remove a directory from the watch registry.",
                schema_for_type::<UnwatchDirectoryParams>(),
            ),
            Tool::new(
                "list_watched_directories",
                "List directories currently registered as watched.",
                schema_for_type::<EmptyParams>(),
            ),
        ];

        Ok(ListToolsResult {
            meta: None,
            tools,
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let call = ToolCall::parse(request.name.as_ref(), request.arguments)?;
        match self.dispatch(call).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(error) => Ok(CallToolResult::error(vec![Content::text(error)])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use localsearch_tools::CapabilityDetector;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // Test Utilities
    // =========================================================================

    /// Create a test server over a temp tree, forced onto the fallback path
    fn create_test_server() -> (LocalSearchMcpServer, TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "hello world\n").unwrap();
        fs::write(temp_dir.path().join("b.md"), "hello markdown\n").unwrap();
        fs::write(temp_dir.path().join("README.md"), "# Readme\n").unwrap();

        let config = SearchConfig {
            search_root: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        let core = SearchCore::in_memory(config, CapabilityDetector::fallback_only()).unwrap();
        (LocalSearchMcpServer::new(Arc::new(core)), temp_dir)
    }

    fn args(value: Value) -> Option<JsonObject> {
        match value {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    // =========================================================================
    // Parsing Tests
    // =========================================================================

    #[test]
    fn test_parse_applies_defaults() {
        let call = ToolCall::parse("search_content", args(json!({"query": "x"}))).unwrap();
        let ToolCall::SearchContent(params) = call else {
            panic!("wrong variant");
        };
        assert_eq!(params.limit, 50);
        assert_eq!(params.file_pattern, "**/*");
        assert!(!params.case_sensitive);
        assert!(!params.whole_word);

        let ToolCall::SearchFiles(params) =
            ToolCall::parse("search_files", args(json!({"query": "x"}))).unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(params.limit, 20);

        let ToolCall::FindFiles(params) = ToolCall::parse("find_files", None).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(params.limit, 100);
        assert_eq!(params.name_pattern, "*");

        let ToolCall::WatchDirectory(params) =
            ToolCall::parse("watch_directory", args(json!({"directory": "."}))).unwrap()
        else {
            panic!("wrong variant");
        };
        assert!(params.recursive);
    }

    #[test]
    fn test_unknown_tool_is_method_not_found() {
        let err = ToolCall::parse("delete_everything", None).unwrap_err();
        assert_eq!(err.code.0, ErrorCode::METHOD_NOT_FOUND.0);
    }

    #[test]
    fn test_missing_required_argument_is_invalid_params() {
        let err = ToolCall::parse("search_files", args(json!({"limit": 3}))).unwrap_err();
        assert_eq!(err.code.0, ErrorCode::INVALID_PARAMS.0);
    }

    // =========================================================================
    // Handler Tests
    // =========================================================================

    #[tokio::test]
    async fn test_search_content_handler() {
        let (server, _dir) = create_test_server();
        let text = server
            .dispatch(ToolCall::SearchContent(SearchContentParams {
                query: "hello".to_string(),
                directory: None,
                case_sensitive: false,
                whole_word: false,
                file_pattern: "*.txt".to_string(),
                limit: 50,
            }))
            .await
            .unwrap();

        assert!(text.starts_with("Found 1 matches"));
        assert!(text.contains("a.txt:1:1"));
    }

    #[tokio::test]
    async fn test_search_files_handler() {
        let (server, _dir) = create_test_server();
        let text = server
            .dispatch(ToolCall::parse("search_files", args(json!({"query": "readme"}))).unwrap())
            .await
            .unwrap();
        assert!(text.contains("README.md"));
        assert!(text.contains("fuzzy-scan"));
    }

    #[tokio::test]
    async fn test_search_regex_handler_without_ripgrep() {
        let (server, _dir) = create_test_server();
        let text = server
            .dispatch(ToolCall::parse("search_regex", args(json!({"pattern": "hel+o"}))).unwrap())
            .await
            .unwrap();
        assert_eq!(text, crate::dispatcher::REGEX_REQUIRES_RIPGREP);
    }

    #[tokio::test]
    async fn test_invalid_directory_is_tool_error() {
        let (server, dir) = create_test_server();
        let missing = dir.path().join("missing").to_string_lossy().to_string();
        let err = server
            .dispatch(ToolCall::SearchFiles(SearchFilesParams {
                query: "x".to_string(),
                directory: Some(missing),
                limit: 20,
                file_types: vec![],
            }))
            .await
            .unwrap_err();
        assert!(err.contains("Directory not found"));
    }

    #[tokio::test]
    async fn test_get_file_info_handler() {
        let (server, _dir) = create_test_server();
        let text = server
            .dispatch(ToolCall::GetFileInfo(GetFileInfoParams {
                file_path: "a.txt".to_string(),
            }))
            .await
            .unwrap();
        assert!(text.contains("Name: a.txt"));
        assert!(text.contains("hello world"));

        let err = server
            .dispatch(ToolCall::GetFileInfo(GetFileInfoParams {
                file_path: "missing.txt".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err, "File not found: missing.txt");
    }

    #[tokio::test]
    async fn test_watch_lifecycle() {
        let (server, dir) = create_test_server();
        let directory = dir.path().to_string_lossy().to_string();
        let watch = |d: &str| {
            ToolCall::WatchDirectory(WatchDirectoryParams {
                directory: d.to_string(),
                recursive: true,
            })
        };

        let started = server.dispatch(watch(&directory)).await.unwrap();
        assert!(started.starts_with("Started watching directory:"));

        let again = server.dispatch(watch(&directory)).await.unwrap();
        assert!(again.starts_with("Already watching:"));

        let listed = server
            .dispatch(ToolCall::ListWatchedDirectories)
            .await
            .unwrap();
        assert!(listed.starts_with("Watching 1 directories"));

        let stopped = server
            .dispatch(ToolCall::UnwatchDirectory(UnwatchDirectoryParams {
                directory: directory.clone(),
            }))
            .await
            .unwrap();
        assert!(stopped.starts_with("Stopped watching"));

        let missing = server.dispatch(watch("missing-dir")).await.unwrap_err();
        assert_eq!(missing, "Directory not found: missing-dir");
    }

    #[test]
    fn test_server_info() {
        let (server, _dir) = create_test_server();
        let info = server.get_info();
        assert_eq!(info.server_info.name, "localsearch");
        assert!(info.capabilities.tools.is_some());
    }
}
