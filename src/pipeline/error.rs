//! Fetch failures the pipeline absorbs.

use thiserror::Error;

/// A failed fetch attempt. Neither kind is retried or surfaced to callers;
/// both only mark the board outdated.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("reference data load failed: {0:#}")]
    ReferenceLoad(anyhow::Error),

    #[error("live ticker fetch failed: {0:#}")]
    LiveFetch(anyhow::Error),
}
