//! HTTP client abstraction for the completion endpoint.
//!
//! This module provides a trait-based abstraction over HTTP clients, enabling
//! dependency injection and easy mocking in tests.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Trait for HTTP communication with external APIs.
///
/// This abstraction allows injecting mock HTTP clients for testing without
/// making real network requests.
///
/// # Example
///
/// ```ignore
/// use conjure::http_client::{HttpClient, ReqwestHttpClient};
///
/// let client = ReqwestHttpClient::new();
/// let response = client.post_json(
///     "https://api.example.com/endpoint",
///     &[("api-key", "secret")],
///     r#"{"key":"value"}"#.to_string(),
/// ).await?;
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a POST request with an already-serialized JSON body and returns
    /// the full response text.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to send the request to
    /// * `headers` - Key-value pairs of headers to include
    /// * `body` - The JSON body to send, sent byte-for-byte
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be read.
    /// A non-success status is not an error; the body is returned as-is.
    async fn post_json(&self, url: &str, headers: &[(&str, &str)], body: String) -> Result<String>;
}

/// HTTP client implementation using reqwest.
///
/// This is the default production implementation that makes real HTTP
/// requests. No timeout is configured beyond reqwest's defaults.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Creates a new HTTP client with default configuration.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post_json(&self, url: &str, headers: &[(&str, &str)], body: String) -> Result<String> {
        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        for (key, value) in headers {
            request = request.header(*key, *value);
        }

        let response = request.body(body).send().await?;
        debug!("Completion endpoint answered with status {}", response.status());
        Ok(response.text().await?)
    }
}
