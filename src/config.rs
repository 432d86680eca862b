//! Configuration for the catalogue client

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::identifier::IdPolicy;

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct CatalogueConfig {
    /// Project base URL
    pub url: Url,
    /// Anonymous (publishable) API key
    pub anon_key: String,
}

impl CatalogueConfig {
    /// Creates a new configuration, validating the URL.
    pub fn new(url_str: &str, anon_key: String) -> Result<Self> {
        let url = Url::parse(url_str)?;
        if anon_key.is_empty() {
            return Err(Error::config("anon_key cannot be empty"));
        }
        Ok(Self { url, anon_key })
    }

    /// Reads `SUPABASE_URL` and `SUPABASE_ANON_KEY` from the environment.
    pub fn from_env() -> Result<Self> {
        let url_str = std::env::var("SUPABASE_URL")
            .map_err(|_| Error::config("SUPABASE_URL environment variable not found"))?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY")
            .map_err(|_| Error::config("SUPABASE_ANON_KEY environment variable not found"))?;
        Self::new(&url_str, anon_key)
    }

    /// Base URL without a trailing slash
    pub(crate) fn base_url(&self) -> String {
        self.url.as_str().trim_end_matches('/').to_string()
    }
}

/// Tunables for the catalogue client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Table holding product documents
    pub products_table: String,

    /// Table holding user documents
    pub users_table: String,

    /// Bucket holding product images
    pub images_bucket: String,

    /// Number of products returned by the default featured read
    pub featured_count: usize,

    /// Product identifier generation policy
    pub id_policy: IdPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            products_table: "products".to_string(),
            users_table: "users".to_string(),
            images_bucket: "product-images".to_string(),
            featured_count: 6,
            id_policy: IdPolicy::default(),
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the products table
    pub fn with_products_table(mut self, value: &str) -> Self {
        self.products_table = value.to_string();
        self
    }

    /// Set the users table
    pub fn with_users_table(mut self, value: &str) -> Self {
        self.users_table = value.to_string();
        self
    }

    /// Set the images bucket
    pub fn with_images_bucket(mut self, value: &str) -> Self {
        self.images_bucket = value.to_string();
        self
    }

    /// Set the default featured count
    pub fn with_featured_count(mut self, value: usize) -> Self {
        self.featured_count = value;
        self
    }

    /// Set the identifier policy
    pub fn with_id_policy(mut self, value: IdPolicy) -> Self {
        self.id_policy = value;
        self
    }
}
