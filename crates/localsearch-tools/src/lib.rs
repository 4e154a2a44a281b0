//! Search backends for LocalSearch.
//!
//! This crate provides:
//! - The uniform result model every backend produces
//! - Native backend discovery (`fd`/`fdfind`, `rg`) and bounded process execution
//! - Native adapters that parse `fd` and `rg --json` output
//! - In-process fallback scanners with the same contract
//! - Metadata filtering (`find_files`) and single-file inspection
//!
//! Caching and backend selection live in `localsearch-core`.

pub mod capability;
pub mod error;
pub mod fallback;
pub mod file_info;
pub mod find;
pub mod fuzzy;
pub mod model;
pub mod native;
pub mod process;
pub mod walk;

mod shared;

pub use capability::{Capability, CapabilityDetector};
pub use error::{Result, SearchError};
pub use fallback::{FuzzyFileScanner, LineScanner};
pub use file_info::{FileInfo, Preview, get_file_info};
pub use find::find_files;
pub use model::{
    BackendKind, BackendRun, ContentMode, ContentSearchRequest, FileSearchRequest, FindRequest,
    RunStatus, SearchResult, normalize_file_types,
};
pub use native::{ContentSearchBackend, FdBackend, FileSearchBackend, RipgrepBackend};
pub use tokio_util::sync::CancellationToken;
pub use walk::walk_files;
