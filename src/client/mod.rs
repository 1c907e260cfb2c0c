//! Client construction and configuration.

mod pipeline;
mod services;

pub use services::{Jobs, Keys, Llm, Schemas, Sites};

use crate::cache::{hash_string, Cache, MemoryCache};
use crate::error::{Error, Result};
use crate::logger::{log_fields, Logger, NoopLogger};
use crate::retry::RetryPolicy;
use crate::transport::{ReqwestTransport, Transport};
use crate::version::{build_user_agent, VersionGate, MAX_KNOWN_API_VERSION, MIN_API_VERSION};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.refyne.uk";
/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default capacity of the built-in response cache.
pub const DEFAULT_CACHE_ENTRIES: usize = 100;

/// Builder for constructing a [`Client`].
pub struct ClientBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    cache: Option<Arc<dyn Cache>>,
    cache_enabled: bool,
    transport: Option<Arc<dyn Transport>>,
    logger: Option<Arc<dyn Logger>>,
    user_agent_suffix: Option<String>,
    min_api_version: String,
    max_known_api_version: String,
}

impl ClientBuilder {
    /// Create a new client builder with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            cache: None,
            cache_enabled: true,
            transport: None,
            logger: None,
            user_agent_suffix: None,
            min_api_version: MIN_API_VERSION.to_string(),
            max_known_api_version: MAX_KNOWN_API_VERSION.to_string(),
        }
    }

    /// Set the API base URL. A trailing slash is dropped.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the timeout applied to each attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how many times a transient failure is retried.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Use a custom cache store.
    pub fn cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Enable or disable response caching.
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Use a custom transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom logger.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Append a product token to the User-Agent header.
    pub fn user_agent_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.user_agent_suffix = Some(suffix.into());
        self
    }

    /// Override the range of API versions this client accepts.
    pub fn api_version_range(
        mut self,
        min_version: impl Into<String>,
        max_known_version: impl Into<String>,
    ) -> Self {
        self.min_api_version = min_version.into();
        self.max_known_api_version = max_known_version.into();
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config("API key is required".into()));
        }

        let logger: Arc<dyn Logger> = self.logger.unwrap_or_else(|| Arc::new(NoopLogger));

        if !self.base_url.starts_with("https://") {
            logger.warn(
                "API base URL is not using HTTPS. This is insecure.",
                Some(&log_fields! { "base_url" => self.base_url }),
            );
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => {
                let http = reqwest::Client::builder()
                    .build()
                    .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
                Arc::new(ReqwestTransport::with_client(http))
            }
        };

        let cache: Arc<dyn Cache> = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryCache::new(DEFAULT_CACHE_ENTRIES)));

        let user_agent = build_user_agent(self.user_agent_suffix.as_deref());
        let headers = default_headers(&self.api_key, &user_agent)?;

        Ok(Client {
            base_url: self.base_url,
            headers,
            transport,
            cache,
            cache_enabled: self.cache_enabled,
            logger,
            timeout: self.timeout,
            retry: RetryPolicy::new(self.max_retries),
            auth_hash: hash_string(&self.api_key),
            user_agent,
            min_api_version: self.min_api_version,
            max_known_api_version: self.max_known_api_version,
            version_gate: VersionGate::new(),
        })
    }
}

fn default_headers(api_key: &str, user_agent: &str) -> Result<HeaderMap> {
    let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
        .map_err(|_| Error::Config("API key contains characters not allowed in a header".into()))?;
    auth.set_sensitive(true);

    let user_agent = HeaderValue::from_str(user_agent)
        .map_err(|_| Error::Config("User-Agent suffix contains invalid characters".into()))?;

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, user_agent);
    Ok(headers)
}

/// Per-call options for [`Client::execute`].
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Skip the cache lookup. A cacheable response is still stored.
    pub skip_cache: bool,
    /// Abort the call, including any pending retry wait, when cancelled.
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    /// Default options: use the cache, no cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bypass the cache lookup for this call.
    #[must_use]
    pub fn with_skip_cache(mut self) -> Self {
        self.skip_cache = true;
        self
    }

    /// Tie the call to a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Client for the Refyne API.
///
/// Every call goes through [`Client::execute`], which adds authentication,
/// serves and fills the response cache, retries transient failures and
/// turns error responses into [`Error`] values. The client is `Send + Sync`;
/// share it with an `Arc` across tasks.
///
/// # Example
///
/// ```rust,no_run
/// use refyne_client::{Client, ExtractRequest};
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() -> Result<(), refyne_client::Error> {
///     let client = Client::builder("your-api-key").build()?;
///
///     let result = client.extract(ExtractRequest {
///         url: "https://example.com".into(),
///         schema: json!({"title": "string"}),
///         ..Default::default()
///     }).await?;
///
///     println!("{:?}", result.data);
///     Ok(())
/// }
/// ```
pub struct Client {
    base_url: String,
    headers: HeaderMap,
    transport: Arc<dyn Transport>,
    cache: Arc<dyn Cache>,
    cache_enabled: bool,
    logger: Arc<dyn Logger>,
    timeout: Duration,
    retry: RetryPolicy,
    auth_hash: String,
    user_agent: String,
    min_api_version: String,
    max_known_api_version: String,
    version_gate: VersionGate,
}

impl Client {
    /// Create a new client builder.
    pub fn builder(api_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(api_key)
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// User-Agent sent with every request.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Retry limits in effect.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Whether GET responses are cached.
    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    /// True once the server's API version has been checked.
    pub fn api_version_checked(&self) -> bool {
        self.version_gate.is_checked()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("cache_enabled", &self.cache_enabled)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let client = Client::builder("test-api-key").build().unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(client.retry_policy().max_retries, DEFAULT_MAX_RETRIES);
        assert!(client.cache_enabled());
        assert!(!client.api_version_checked());
        assert_eq!(client.auth_hash, hash_string("test-api-key"));
    }

    #[test]
    fn test_builder_options() {
        let client = Client::builder("test-api-key")
            .base_url("https://custom.api.test/")
            .timeout(Duration::from_secs(60))
            .max_retries(5)
            .cache_enabled(false)
            .user_agent_suffix("MyApp/1.0")
            .build()
            .unwrap();

        assert_eq!(client.base_url(), "https://custom.api.test");
        assert_eq!(client.timeout(), Duration::from_secs(60));
        assert_eq!(client.retry_policy().max_attempts(), 6);
        assert!(!client.cache_enabled());
        assert!(client.user_agent().ends_with("MyApp/1.0"));
    }

    #[test]
    fn test_builder_rejects_bad_keys() {
        assert!(matches!(
            Client::builder("").build(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Client::builder("key\nwith-newline").build(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_default_headers() {
        let headers = default_headers("secret", "ua/1.0").unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer secret");
        assert!(headers[AUTHORIZATION].is_sensitive());
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[ACCEPT], "application/json");
        assert_eq!(headers[USER_AGENT], "ua/1.0");
    }

    #[test]
    fn test_debug_hides_credentials() {
        let client = Client::builder("super-secret").build().unwrap();
        assert!(!format!("{client:?}").contains("super-secret"));
    }
}
