//! HTTP client abstraction and native implementation.
//!
//! Provides a platform-agnostic [`HttpClient`] trait and a native
//! implementation backed by [`reqwest`]. Extension services are reached
//! exclusively through this trait, so tests can substitute a scripted
//! client for the network.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Status and body of an answered request, whatever the status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code the service answered with.
    pub status: u16,
    /// Raw response body; empty when the service sent none.
    pub body: Vec<u8>,
}

/// Transport-level HTTP failures.
///
/// A response with any status code is *not* an error; only failing to
/// obtain a response is.
#[derive(Error, Debug)]
pub enum HttpError {
    /// The method string is not a valid HTTP method.
    #[error("invalid http method: {0}")]
    InvalidMethod(String),

    /// Connecting, sending or reading the response failed.
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Outbound HTTP seam used to reach extension services.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send one request. A `None` body sends no body at all.
    async fn request(
        &self,
        method: &str,
        url: &str,
        headers: &HashMap<String, String>,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse, HttpError>;
}

/// Native HTTP client using [`reqwest`].
pub struct NativeHttpClient {
    client: reqwest::Client,
}

impl NativeHttpClient {
    /// Create a new native HTTP client with sensible defaults.
    ///
    /// No request timeout is set here: the pipeline executor bounds each
    /// stage itself. Idle pooled connections are dropped after 30 seconds.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .pool_idle_timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("failed to build reqwest client"),
        }
    }
}

impl Default for NativeHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for NativeHttpClient {
    async fn request(
        &self,
        method: &str,
        url: &str,
        headers: &HashMap<String, String>,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse, HttpError> {
        let reqwest_method = method
            .parse::<reqwest::Method>()
            .map_err(|_| HttpError::InvalidMethod(method.to_string()))?;
        let mut builder = self.client.request(reqwest_method, url);

        for (key, value) in headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        if let Some(body_bytes) = body {
            builder = builder.body(body_bytes.to_vec());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    #[tokio::test]
    async fn test_native_post_sends_body_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/validate"))
            .and(header("x-apix-stage", "validation"))
            .and(body_bytes(b"title=x".to_vec()))
            .respond_with(ResponseTemplate::new(412).set_body_string("nope"))
            .expect(1)
            .mount(&server)
            .await;

        let client = NativeHttpClient::new();
        let mut headers = HashMap::new();
        headers.insert("x-apix-stage".to_string(), "validation".to_string());
        let response = client
            .request(
                "POST",
                &format!("{}/validate", server.uri()),
                &headers,
                Some(b"title=x".as_slice()),
            )
            .await
            .unwrap();

        // Non-2xx statuses are responses, not errors.
        assert_eq!(
            response,
            HttpResponse {
                status: 412,
                body: b"nope".to_vec(),
            }
        );
    }

    #[tokio::test]
    async fn test_native_none_body_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(|req: &Request| {
                ResponseTemplate::new(if req.body.is_empty() { 204 } else { 422 })
            })
            .mount(&server)
            .await;

        let response = NativeHttpClient::new()
            .request("DELETE", &server.uri(), &HashMap::new(), None)
            .await
            .unwrap();
        assert_eq!(response.status, 204);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_native_invalid_method() {
        let client = NativeHttpClient::new();
        let err = client
            .request("NOT A METHOD", "http://127.0.0.1:1/", &HashMap::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidMethod(_)));
    }

    #[tokio::test]
    async fn test_native_connection_refused_is_transport_error() {
        let client = NativeHttpClient::new();
        // Port 1 on loopback is essentially never listening.
        let err = client
            .request("GET", "http://127.0.0.1:1/", &HashMap::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Transport(ref e) if !e.is_builder()));
    }

    #[tokio::test]
    async fn test_native_malformed_url_is_builder_error() {
        let err = NativeHttpClient::new()
            .request("POST", "not a url", &HashMap::new(), Some(b"x".as_slice()))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Transport(ref e) if e.is_builder()));
    }
}
