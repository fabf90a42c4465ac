//! Async entry points that run the import on tokio's blocking pool.

use crate::error::Result;
use crate::import::{import_package, inspect_package, ImportOutcome, ImportRequest, PackagePreview};
use crate::settings::ImportSettings;
use tokio::task::JoinError;

/// [`inspect_package`] off the async executor.
pub async fn inspect_package_blocking(
    bytes: Vec<u8>,
    source_name: Option<String>,
    settings: ImportSettings,
) -> Result<PackagePreview> {
    tokio::task::spawn_blocking(move || inspect_package(&bytes, source_name.as_deref(), &settings))
        .await
        .unwrap_or_else(rethrow)
}

/// [`import_package`] off the async executor.
pub async fn import_package_blocking(
    bytes: Vec<u8>,
    request: ImportRequest,
) -> Result<ImportOutcome> {
    tokio::task::spawn_blocking(move || import_package(&bytes, &request))
        .await
        .unwrap_or_else(rethrow)
}

// A panicking import re-raises on the caller. A task cancelled because the
// runtime shut down before it ran has no result to return.
fn rethrow<T>(e: JoinError) -> T {
    if e.is_panic() {
        std::panic::resume_unwind(e.into_panic());
    }
    panic!("import task was cancelled before completing: {e}");
}
