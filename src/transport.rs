//! HTTP transport abstraction.
//!
//! The client hands a fully-built [`HttpRequest`] to a [`Transport`] and gets
//! back an [`HttpResponse`] with the body already read. Swap the transport to
//! add proxies, custom TLS, or scripted responses in tests.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// A request ready to be sent.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Request headers, including authentication.
    pub headers: HeaderMap,
    /// Serialized JSON body.
    pub body: Option<Bytes>,
}

/// A response with its body fully buffered.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Look up a header as a string, ignoring values that are not visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Failure to obtain a response at all.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The attempt did not finish within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,

    /// Error raised by the reqwest transport.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Error raised by a custom transport.
    #[error("{0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Wrap an arbitrary error from a custom transport.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        TransportError::Other(err.into())
    }
}

/// Sends requests over the network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and buffer the response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Default transport backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a default reqwest client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport around an existing reqwest client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_header_lookup() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-version", HeaderValue::from_static("1.2.3"));
        let response = HttpResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::new(),
        };

        assert_eq!(response.header("X-API-Version"), Some("1.2.3"));
        assert_eq!(response.header("Retry-After"), None);
    }

    #[test]
    fn test_other_error_display() {
        let err = TransportError::other("connection reset");
        assert_eq!(err.to_string(), "connection reset");
        assert_eq!(TransportError::Cancelled.to_string(), "request cancelled");
    }
}
