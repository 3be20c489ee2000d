//! Local filesystem blob store. URLs are `{public_base_url}/{key}`.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{check_key, BlobError, BlobStore};

pub struct FilesystemBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FilesystemBlobStore {
    pub async fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Result<Self, BlobError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root, public_base_url: public_base_url.trim_end_matches('/').to_string() })
    }

    pub fn root(&self) -> &std::path::Path { &self.root }

    fn key_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.public_base_url.as_str())?.strip_prefix('/')
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(&self, key: &str, bytes: Bytes, _content_type: &str) -> Result<String, BlobError> {
        check_key(key)?;
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        // write to a temp file and rename so readers never see a partial object
        let tmp = path.with_extension(format!("tmp-{}", Uuid::new_v4().simple()));
        fs::write(&tmp, &bytes).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(format!("{}/{}", self.public_base_url, key))
    }

    #[instrument(skip(self))]
    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        let key = self.key_from_url(url).ok_or_else(|| BlobError::Foreign(url.to_string()))?;
        check_key(key)?;
        match fs::remove_file(self.root.join(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(%url, "blob already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn owns(&self, url: &str) -> bool {
        self.key_from_url(url).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> FilesystemBlobStore {
        let root = std::env::temp_dir().join(format!("blob_store_{}", Uuid::new_v4()));
        FilesystemBlobStore::new(root, "http://localhost:8080/blobs/").await.unwrap()
    }

    #[tokio::test]
    async fn put_then_delete_is_idempotent() -> Result<(), anyhow::Error> {
        let store = temp_store().await;
        let url = store.put("cars/clio_1.jpg", Bytes::from_static(b"jpeg"), "image/jpeg").await?;
        assert_eq!(url, "http://localhost:8080/blobs/cars/clio_1.jpg");
        assert!(store.owns(&url));
        let on_disk = fs::read(store.root().join("cars/clio_1.jpg")).await?;
        assert_eq!(on_disk, b"jpeg");

        store.delete(&url).await?;
        assert!(fs::metadata(store.root().join("cars/clio_1.jpg")).await.is_err());
        // missing object is fine
        store.delete(&url).await?;

        let _ = fs::remove_dir_all(store.root()).await;
        Ok(())
    }

    #[tokio::test]
    async fn rejects_foreign_urls_and_traversal() {
        let store = temp_store().await;
        assert!(!store.owns("https://cdn.example.com/cars/x.jpg"));
        assert!(matches!(store.delete("https://cdn.example.com/cars/x.jpg").await, Err(BlobError::Foreign(_))));
        assert!(matches!(store.put("../escape.jpg", Bytes::new(), "image/jpeg").await, Err(BlobError::InvalidKey(_))));
        assert!(matches!(store.delete("http://localhost:8080/blobs/../x").await, Err(BlobError::InvalidKey(_))));
        let _ = fs::remove_dir_all(store.root()).await;
    }
}
