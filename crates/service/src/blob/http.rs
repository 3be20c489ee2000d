//! Remote object store spoken to over HTTP.
//!
//! `PUT {api_url}/{key}` with the write token returns `{"url": ...}`;
//! `POST {api_url}/delete` with `{"urls": [...]}` removes objects.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use super::{check_key, BlobError, BlobStore};

#[derive(Debug, Deserialize)]
struct PutResponse {
    url: String,
}

#[derive(Clone)]
pub struct HttpBlobStore {
    client: reqwest::Client,
    api_url: String,
    token: String,
    /// Host fragment every public URL of this store contains.
    public_host: String,
}

impl HttpBlobStore {
    pub fn new(api_url: &str, token: &str) -> Self {
        let api_url = api_url.trim_end_matches('/').to_string();
        let public_host = reqwest::Url::parse(&api_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        Self { client: reqwest::Client::new(), api_url, token: token.to_string(), public_host }
    }

    /// Override the host fragment used by `owns` (e.g. a CDN domain).
    pub fn with_public_host(mut self, host: &str) -> Self {
        self.public_host = host.to_string();
        self
    }

    async fn rejected(resp: reqwest::Response) -> BlobError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        BlobError::Rejected { status, body }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String, BlobError> {
        check_key(key)?;
        let resp = self
            .client
            .put(format!("{}/{}", self.api_url, key))
            .bearer_auth(&self.token)
            .header(header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| BlobError::Http(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::rejected(resp).await);
        }
        let body: PutResponse = resp.json().await.map_err(|e| BlobError::Http(e.to_string()))?;
        if body.url.trim().is_empty() {
            return Err(BlobError::Http("store returned an empty url".into()));
        }
        Ok(body.url)
    }

    #[instrument(skip(self))]
    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        if !self.owns(url) {
            return Err(BlobError::Foreign(url.to_string()));
        }
        let resp = self
            .client
            .post(format!("{}/delete", self.api_url))
            .bearer_auth(&self.token)
            .json(&json!({ "urls": [url] }))
            .send()
            .await
            .map_err(|e| BlobError::Http(e.to_string()))?;
        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                debug!(%url, "blob already absent");
                Ok(())
            }
            _ => Err(Self::rejected(resp).await),
        }
    }

    /// The public host itself or any subdomain of it.
    fn owns(&self, url: &str) -> bool {
        let host = self.public_host.as_str();
        if host.is_empty() {
            return false;
        }
        reqwest::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h == host || h.strip_suffix(host).is_some_and(|sub| sub.ends_with('.'))))
            .unwrap_or(false)
    }
}
