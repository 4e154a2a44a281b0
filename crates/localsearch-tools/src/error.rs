//! Error types for search operations

use thiserror::Error;

/// Search error types
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for search operations
pub type Result<T> = std::result::Result<T, SearchError>;
