//! Object storage for cover images: `put(key, bytes) -> url`, `delete(url)`.
//!
//! Deletes are idempotent on missing objects. `owns` tells whether a URL
//! belongs to the store's namespace; foreign URLs are never deleted.

pub mod filesystem;
pub mod http;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

pub use filesystem::FilesystemBlobStore;
pub use http::HttpBlobStore;

/// Prefix for every cover key.
pub const COVER_PREFIX: &str = "cars";

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("http error: {0}")]
    Http(String),
    #[error("store rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("url not owned by this store: {0}")]
    Foreign(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`; returns the public URL.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String, BlobError>;
    /// Remove the object behind `url`. Missing objects are not an error.
    async fn delete(&self, url: &str) -> Result<(), BlobError>;
    fn owns(&self, url: &str) -> bool;
}

/// Fresh key for an uploaded cover: `cars/{base}_{millis}_{suffix}.{ext}`.
///
/// ```
/// let key = service::blob::cover_key("My Clio!.JPG", 1_700_000_000_000);
/// assert!(key.starts_with("cars/My_Clio__1700000000000_"));
/// assert!(key.ends_with(".jpg"));
/// ```
pub fn cover_key(filename: &str, now_millis: i64) -> String {
    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => (stem, ext.to_ascii_lowercase()),
        _ => (filename, "jpg".to_string()),
    };
    let mut base: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if base.is_empty() { base.push_str("cover"); }
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    format!("{COVER_PREFIX}/{base}_{now_millis}_{suffix}.{ext}")
}

/// Reject keys that could escape a storage root.
pub(crate) fn check_key(key: &str) -> Result<(), BlobError> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
        return Err(BlobError::InvalidKey(key.to_string()));
    }
    for component in std::path::Path::new(key).components() {
        if !matches!(component, std::path::Component::Normal(_)) {
            return Err(BlobError::InvalidKey(key.to_string()));
        }
    }
    Ok(())
}

/// In-memory store recording every call, for tests
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    pub const MEMORY_BASE: &str = "memory://blobs";

    #[derive(Default)]
    pub struct InMemoryBlobStore {
        objects: Mutex<HashMap<String, Bytes>>, // key: url
        puts: Mutex<Vec<String>>,
        deletes: Mutex<Vec<String>>,
        fail_puts: AtomicBool,
        fail_deletes: AtomicBool,
    }

    impl InMemoryBlobStore {
        pub fn set_fail_puts(&self, fail: bool) { self.fail_puts.store(fail, Ordering::SeqCst); }
        pub fn set_fail_deletes(&self, fail: bool) { self.fail_deletes.store(fail, Ordering::SeqCst); }

        pub fn contains(&self, url: &str) -> bool { self.objects.lock().unwrap().contains_key(url) }
        pub fn object_count(&self) -> usize { self.objects.lock().unwrap().len() }
        pub fn puts(&self) -> Vec<String> { self.puts.lock().unwrap().clone() }
        /// Every delete attempt, successful or not.
        pub fn deletes(&self) -> Vec<String> { self.deletes.lock().unwrap().clone() }

        /// Wait until at least `n` delete attempts were recorded; cleanup runs detached.
        pub async fn wait_for_deletes(&self, n: usize) -> bool {
            for _ in 0..200 {
                if self.deletes.lock().unwrap().len() >= n { return true; }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            false
        }
    }

    #[async_trait]
    impl BlobStore for InMemoryBlobStore {
        async fn put(&self, key: &str, bytes: Bytes, _content_type: &str) -> Result<String, BlobError> {
            check_key(key)?;
            if self.fail_puts.load(Ordering::SeqCst) {
                return Err(BlobError::Rejected { status: 503, body: "injected put failure".into() });
            }
            let url = format!("{MEMORY_BASE}/{key}");
            self.objects.lock().unwrap().insert(url.clone(), bytes);
            self.puts.lock().unwrap().push(url.clone());
            Ok(url)
        }

        async fn delete(&self, url: &str) -> Result<(), BlobError> {
            self.deletes.lock().unwrap().push(url.to_string());
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(BlobError::Rejected { status: 503, body: "injected delete failure".into() });
            }
            self.objects.lock().unwrap().remove(url);
            Ok(())
        }

        fn owns(&self, url: &str) -> bool { url.starts_with(MEMORY_BASE) }
    }
}
