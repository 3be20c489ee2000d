//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::warn;

/// Ensure the blob root exists when the filesystem backend is used.
/// A missing directory is created; failure to create it is fatal.
pub async fn ensure_dir(dir: &str) -> anyhow::Result<()> {
    if dir.trim().is_empty() {
        warn!("empty directory path passed to ensure_dir; skipping");
        return Ok(());
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {dir}: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_dir_creates_nested() -> anyhow::Result<()> {
        let dir = std::env::temp_dir()
            .join(format!("catalog_env_{}", uuid::Uuid::new_v4()))
            .join("nested");
        let path = dir.to_string_lossy().to_string();
        ensure_dir(&path).await?;
        assert!(tokio::fs::metadata(&dir).await?.is_dir());
        // second call is a no-op
        ensure_dir(&path).await?;
        let _ = tokio::fs::remove_dir_all(dir.parent().unwrap()).await;
        Ok(())
    }
}
