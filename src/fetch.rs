//! HTTP transport shared by the hosted backend clients

use std::fmt;
use std::sync::{Arc, RwLock};

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client, Method, RequestBuilder, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::config::{CatalogueConfig, ClientOptions};
use crate::error::{Error, Result};

const CLIENT_INFO: &str = concat!("jewellery-catalogue/", env!("CARGO_PKG_VERSION"));

/// Access token of the signed-in principal, shared between the auth client
/// and the data clients that must act on its behalf.
#[derive(Debug, Clone, Default)]
pub struct BearerToken(Arc<RwLock<Option<String>>>);

impl BearerToken {
    /// Create an empty token slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored token
    pub fn set(&self, token: Option<String>) {
        let mut slot = match self.0.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = token;
    }

    /// The stored token, if any
    pub fn get(&self) -> Option<String> {
        match self.0.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Error body returned by PostgREST and the storage API
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
    pub error: Option<String>,
    /// Auth endpoints report their message here
    pub error_description: Option<String>,
    pub msg: Option<String>,
}

impl fmt::Display for ApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("Code: {}", code));
        }
        if let Some(error) = &self.error {
            parts.push(format!("Error: {}", error));
        }
        if let Some(message) = self
            .message
            .as_ref()
            .or(self.error_description.as_ref())
            .or(self.msg.as_ref())
        {
            parts.push(format!("Message: {}", message));
        }
        if let Some(details) = &self.details {
            parts.push(format!("Details: {}", details));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("Hint: {}", hint));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Map a non-success response body to the crate error.
///
/// HTTP 409 and the Postgres unique-violation code `23505` become
/// [`Error::Conflict`]; everything else is passed through as [`Error::Store`].
pub(crate) fn error_from_status(status: StatusCode, body: &str) -> Error {
    let message = match serde_json::from_str::<ApiErrorDetails>(body) {
        Ok(details) => {
            if details.code.as_deref() == Some("23505") {
                return Error::conflict(details);
            }
            details.to_string()
        }
        Err(_) => body.to_string(),
    };

    if status == StatusCode::CONFLICT {
        Error::conflict(message)
    } else {
        Error::store(status.as_u16(), message)
    }
}

/// Connection to the hosted backend: base URL, API key, HTTP client and the
/// bearer token of the current session.
#[derive(Debug, Clone)]
pub struct Transport {
    base_url: String,
    key: String,
    client: Client,
    token: BearerToken,
}

impl Transport {
    /// Build a transport honoring the configured request timeout
    pub fn new(config: &CatalogueConfig, options: &ClientOptions, token: BearerToken) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            base_url: config.base_url(),
            key: config.anon_key.clone(),
            client: builder.build()?,
            token,
        })
    }

    /// Absolute URL for a path under the project
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The project base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The underlying HTTP client
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// The shared session token slot
    pub fn token(&self) -> &BearerToken {
        &self.token
    }

    /// Bearer credential for the request: the session token or the anon key
    pub fn bearer(&self) -> String {
        self.token.get().unwrap_or_else(|| self.key.clone())
    }

    /// The anon API key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Start a request with the standard headers applied
    pub fn request(&self, method: Method, path: &str) -> FetchBuilder<'_> {
        FetchBuilder::new(&self.client, &self.url(path), method)
            .header("apikey", &self.key)
            .header("X-Client-Info", CLIENT_INFO)
            .bearer_auth(&self.bearer())
    }

    pub fn get(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::POST, path)
    }

    pub fn patch(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::PATCH, path)
    }

    pub fn delete(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::DELETE, path)
    }
}

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            query_params: Vec::new(),
            body: None,
        }
    }

    /// Add a header to the request
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add bearer token authentication to the request
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Add query parameters to the request
    pub fn query(mut self, params: Vec<(String, String)>) -> Self {
        self.query_params.extend(params);
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let json = serde_json::to_vec(body)?;
        self.body = Some(json);
        Ok(self)
    }

    /// Build the request
    fn build(&self) -> Result<RequestBuilder> {
        let mut url = Url::parse(&self.url)?;

        if !self.query_params.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                query_pairs.append_pair(key, value);
            }
        }

        let mut req = self.client.request(self.method.clone(), url.as_str());
        req = req.headers(self.headers.clone());

        if let Some(body) = &self.body {
            req = req.body(body.clone());
        }

        Ok(req)
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<T> {
        let response = self.send().await?;
        let result = response.json::<T>().await?;
        Ok(result)
    }

    /// Execute the request, discarding the response body
    pub async fn execute_unit(&self) -> Result<()> {
        self.send().await?;
        Ok(())
    }

    /// Execute the request and return the response once its status is a success
    pub async fn send(&self) -> Result<Response> {
        let req = self.build()?;
        log::debug!("{} {}", self.method, self.url);
        let response = req.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(error_from_status(status, &text));
        }

        Ok(response)
    }
}
