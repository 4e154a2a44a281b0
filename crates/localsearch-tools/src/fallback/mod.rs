//! In-process scanners used when no native backend is available.
//!
//! Both scanners walk the tree on the blocking pool and honor the same
//! wall-clock limit as the native adapters. Dropping the awaiting future
//! cancels the walk at the next file boundary.

pub mod content;
pub mod files;

pub use content::{LineScanner, scan_content};
pub use files::{FuzzyFileScanner, scan_file_names};

use crate::model::BackendRun;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Run `scan` on the blocking pool under `limit`.
async fn run_blocking_scan<F>(limit: Duration, scan: F) -> BackendRun
where
    F: FnOnce(&CancellationToken) -> BackendRun + Send + 'static,
{
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let worker_flag = cancel.clone();
    let handle = tokio::task::spawn_blocking(move || scan(&worker_flag));

    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(run)) => run,
        Ok(Err(e)) => {
            warn!(error = %e, "Fallback scan task failed");
            BackendRun::failed(Vec::new())
        }
        Err(_) => {
            warn!(
                timeout_ms = limit.as_millis() as u64,
                "Fallback scan timed out"
            );
            BackendRun::timed_out()
        }
    }
}
