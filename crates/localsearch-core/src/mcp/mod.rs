//! MCP (Model Context Protocol) server for LocalSearch

pub mod server;

pub use server::{LocalSearchMcpServer, ToolCall};
