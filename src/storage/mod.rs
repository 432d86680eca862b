//! Object storage for product images

mod memory;

use async_trait::async_trait;
use reqwest::multipart;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::fetch::{error_from_status, Transport};

pub use memory::InMemoryObjects;

/// Binary object storage over a hierarchical key namespace
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` under `key`, replacing any existing object, and return a
    /// durable retrieval URL
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    /// Remove the object a URL returned by [`ObjectStore::put`] points at
    async fn delete(&self, url: &str) -> Result<()>;
}

/// A public bucket of the hosted storage API
#[derive(Debug, Clone)]
pub struct SupabaseBucket {
    transport: Transport,
    bucket_id: String,
}

impl SupabaseBucket {
    /// Create a client for `bucket_id`
    pub fn new(transport: Transport, bucket_id: &str) -> Self {
        Self {
            transport,
            bucket_id: bucket_id.to_string(),
        }
    }

    /// Get the public URL for a file
    pub fn public_url(&self, key: &str) -> String {
        format!("{}{}", self.public_prefix(), key)
    }

    fn public_prefix(&self) -> String {
        self.transport
            .url(&format!("/storage/v1/object/public/{}/", self.bucket_id))
    }

    /// Recover the object key from one of this bucket's public URLs
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        let prefix = self.public_prefix();
        let rest = url.strip_prefix(&prefix)?;
        let key = rest.split(['?', '#']).next().unwrap_or(rest);
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }
}

#[async_trait]
impl ObjectStore for SupabaseBucket {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let url = self
            .transport
            .url(&format!("/storage/v1/object/{}/{}", self.bucket_id, key));

        let file_name = key.rsplit('/').next().unwrap_or(key).to_string();
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(content_type)?;
        let form = multipart::Form::new().part("file", part);

        log::debug!("POST {}", url);
        let response = self
            .transport
            .http()
            .post(&url)
            .header("apikey", self.transport.key())
            .header("Authorization", format!("Bearer {}", self.transport.bearer()))
            .header("Cache-Control", "3600")
            .header("x-upsert", "true")
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(error_from_status(status, &text));
        }

        Ok(self.public_url(key))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let key = self
            .key_from_url(url)
            .ok_or_else(|| Error::validation(format!("{} is not an object of bucket {}", url, self.bucket_id)))?;

        let body = serde_json::json!({
            "prefixes": [key]
        });

        let removed = self
            .transport
            .delete(&format!("/storage/v1/object/{}", self.bucket_id))
            .json(&body)?
            .execute::<Vec<Value>>()
            .await?;

        if removed.is_empty() {
            Err(Error::not_found(&self.bucket_id, &key))
        } else {
            Ok(())
        }
    }
}
