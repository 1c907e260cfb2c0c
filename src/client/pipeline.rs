//! The request-execution pipeline behind every client call.

use super::{Client, RequestOptions};
use crate::cache::{create_cache_entry, generate_cache_key};
use crate::error::{classify, Error, Result};
use crate::logger::log_fields;
use crate::retry::{RetryDecision, RetryReason};
use crate::transport::{HttpRequest, HttpResponse, TransportError};
use crate::version::{check_api_version_compatibility, API_VERSION_HEADER};
use bytes::Bytes;
use reqwest::header::{CACHE_CONTROL, RETRY_AFTER};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

impl Client {
    /// Execute a request against `path` and decode the JSON response.
    ///
    /// GET requests are answered from the cache when a usable entry exists,
    /// and successful GET responses are stored according to their
    /// `Cache-Control` header. Network errors, `429` and `5xx` responses are
    /// retried up to the configured limit. The first response this client
    /// receives is checked against the supported API version range; a server
    /// found too old fails every call after that.
    pub async fn execute<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let cacheable = method == Method::GET && self.cache_enabled;
        let cache_key = generate_cache_key(method.as_str(), &url, Some(&self.auth_hash));

        if cacheable && !options.skip_cache {
            if let Some(entry) = self.cache.get(&cache_key) {
                match serde_json::from_value(entry.value) {
                    Ok(value) => {
                        self.logger.debug(
                            "Serving response from cache",
                            Some(&log_fields! { "url" => url }),
                        );
                        return Ok(value);
                    }
                    Err(err) => self.logger.warn(
                        "Cached response could not be decoded, fetching again",
                        Some(&log_fields! { "url" => url, "error" => err.to_string() }),
                    ),
                }
            }
        }

        let body = body
            .map(serde_json::to_vec)
            .transpose()?
            .map(Bytes::from);
        let request = HttpRequest {
            method,
            url,
            headers: self.headers.clone(),
            body,
        };

        let response = self
            .send_with_retry(request, options.cancel.as_ref())
            .await?;

        self.version_gate
            .check_once(|| self.check_api_version(&response))?;

        if response.status.as_u16() >= 400 {
            return Err(classify(
                response.status,
                response.header(RETRY_AFTER.as_str()),
                &response.body,
            ));
        }

        let value: Value = if response.body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&response.body)?
        };

        let entry = if cacheable {
            create_cache_entry(value.clone(), response.header(CACHE_CONTROL.as_str()))
        } else {
            None
        };
        let decoded = serde_json::from_value(value)?;
        if let Some(entry) = entry {
            self.cache.set(&cache_key, entry);
        }

        Ok(decoded)
    }

    fn check_api_version(&self, response: &HttpResponse) -> Result<()> {
        match response.header(API_VERSION_HEADER) {
            Some(api_version) => check_api_version_compatibility(
                api_version,
                &self.min_api_version,
                &self.max_known_api_version,
                self.logger.as_ref(),
            ),
            None => {
                self.logger.warn("API did not return X-API-Version header", None);
                Ok(())
            }
        }
    }

    /// Send `request` until it succeeds, fails permanently, or the retry
    /// budget runs out. Returns the last response received; only transport
    /// failures become errors here.
    async fn send_with_retry(
        &self,
        request: HttpRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<HttpResponse> {
        let mut attempt: u32 = 1;

        loop {
            let (wait, reason, mut fields) = match self.attempt(request.clone(), cancel).await {
                Ok(response) => {
                    let retry_after = response.header(RETRY_AFTER.as_str());
                    match self.retry.on_status(attempt, response.status, retry_after) {
                        RetryDecision::GiveUp => return Ok(response),
                        RetryDecision::Retry { wait, reason } => (
                            wait,
                            reason,
                            log_fields! { "status" => response.status.as_u16() },
                        ),
                    }
                }
                Err(TransportError::Cancelled) => {
                    return Err(Error::Network(TransportError::Cancelled))
                }
                Err(err) => match self.retry.on_network_error(attempt) {
                    RetryDecision::GiveUp => return Err(Error::Network(err)),
                    RetryDecision::Retry { wait, reason } => {
                        (wait, reason, log_fields! { "error" => err.to_string() })
                    }
                },
            };

            fields.extend(log_fields! {
                "attempt" => attempt,
                "max_retries" => self.retry.max_retries,
                "wait_ms" => saturating_millis(wait),
            });
            self.logger.warn(retry_message(reason), Some(&fields));

            self.pause(wait, cancel).await?;
            attempt += 1;
        }
    }

    /// One attempt, bounded by the client timeout and the caller's token.
    async fn attempt(
        &self,
        request: HttpRequest,
        cancel: Option<&CancellationToken>,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let send = timeout(self.timeout, self.transport.send(request));

        let outcome = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(TransportError::Cancelled),
                outcome = send => outcome,
            },
            None => send.await,
        };

        match outcome {
            Ok(result) => result,
            Err(_elapsed) => Err(TransportError::Timeout(self.timeout)),
        }
    }

    async fn pause(&self, wait: Duration, cancel: Option<&CancellationToken>) -> Result<()> {
        match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(Error::Network(TransportError::Cancelled)),
                _ = sleep(wait) => Ok(()),
            },
            None => {
                sleep(wait).await;
                Ok(())
            }
        }
    }
}

fn saturating_millis(wait: Duration) -> u64 {
    u64::try_from(wait.as_millis()).unwrap_or(u64::MAX)
}

fn retry_message(reason: RetryReason) -> &'static str {
    match reason {
        RetryReason::Network => "Network error, retrying",
        RetryReason::RateLimited => "Rate limited, retrying",
        RetryReason::ServerError(_) => "Server error, retrying",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_millis() {
        assert_eq!(saturating_millis(Duration::ZERO), 0);
        assert_eq!(saturating_millis(Duration::from_secs(30)), 30_000);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_retry_messages() {
        assert_eq!(retry_message(RetryReason::Network), "Network error, retrying");
        assert_eq!(retry_message(RetryReason::RateLimited), "Rate limited, retrying");
        assert_eq!(
            retry_message(RetryReason::ServerError(reqwest::StatusCode::BAD_GATEWAY)),
            "Server error, retrying"
        );
    }
}
