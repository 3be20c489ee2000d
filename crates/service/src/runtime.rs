//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so the binary can prepare storage
//! without depending on the backend details.

use configs::{StorageBackend, StorageConfig};

/// Ensure the filesystem blob root exists; the http backend needs nothing local.
pub async fn ensure_storage(cfg: &StorageConfig) -> anyhow::Result<()> {
    match cfg.backend {
        StorageBackend::Filesystem => common::env::ensure_dir(&cfg.root).await,
        StorageBackend::Http => Ok(()),
    }
}
