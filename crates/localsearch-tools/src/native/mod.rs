//! Adapters around external search executables.

pub mod fd;
pub mod ripgrep;

pub use fd::FdBackend;
pub use ripgrep::{RipgrepBackend, parse_ripgrep_output};

use crate::model::{BackendKind, BackendRun, ContentSearchRequest, FileSearchRequest};
use async_trait::async_trait;

/// Anything that can answer a file-name search.
#[async_trait]
pub trait FileSearchBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Never fails: problems are reported through [`BackendRun::status`].
    async fn search(&self, request: &FileSearchRequest) -> BackendRun;
}

/// Anything that can answer a content search.
#[async_trait]
pub trait ContentSearchBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Never fails: problems are reported through [`BackendRun::status`].
    async fn search(&self, request: &ContentSearchRequest) -> BackendRun;
}
