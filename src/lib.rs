//! Rust client for the Refyne API.
//!
//! Refyne is an LLM-powered web extraction API that transforms unstructured
//! websites into clean, typed data. This crate wraps it in a single request
//! pipeline: bearer authentication, a Cache-Control aware response cache,
//! retries with backoff for network errors, `429` and `5xx`, a one-time API
//! version check, and typed errors.
//!
//! The transport, the cache store and the logger are traits, so each can be
//! replaced through [`ClientBuilder`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use refyne_client::{Client, ExtractRequest};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), refyne_client::Error> {
//!     let client = Client::builder("your-api-key").build()?;
//!
//!     let result = client.extract(ExtractRequest {
//!         url: "https://example.com/product".into(),
//!         schema: json!({
//!             "name": "string",
//!             "price": "number",
//!         }),
//!         ..Default::default()
//!     }).await?;
//!
//!     println!("{:?}", result.data);
//!     Ok(())
//! }
//! ```

mod cache;
mod client;
mod error;
mod logger;
mod retry;
mod transport;
mod types;
mod version;

pub use cache::{
    create_cache_entry, generate_cache_key, hash_string, parse_cache_control, Cache,
    CacheControlDirectives, CacheEntry, MemoryCache,
};
pub use client::{
    Client, ClientBuilder, Jobs, Keys, Llm, RequestOptions, Schemas, Sites, DEFAULT_BASE_URL,
    DEFAULT_CACHE_ENTRIES, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT,
};
pub use error::{classify, Error, Result, DEFAULT_RATE_LIMIT_RETRY_AFTER};
pub use logger::{LogFields, Logger, NoopLogger, TracingLogger};
pub use retry::{
    backoff, parse_retry_after, RetryDecision, RetryPolicy, RetryReason, DEFAULT_RETRY_AFTER,
    MAX_BACKOFF,
};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
pub use types::*;
pub use version::{
    build_user_agent, check_api_version_compatibility, compare_versions, parse_version,
    ApiVersion, VersionGate, API_VERSION_HEADER, MAX_KNOWN_API_VERSION, MIN_API_VERSION,
    SDK_VERSION,
};

/// Re-exports for implementing [`Transport`] and using [`RequestOptions`].
pub use bytes::Bytes;
pub use reqwest::{header, Method, StatusCode};
pub use tokio_util::sync::CancellationToken;
