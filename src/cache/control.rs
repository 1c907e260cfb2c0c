//! Cache-Control header parsing.

use super::{now_secs, CacheEntry};
use serde_json::Value;

/// Parsed Cache-Control header directives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheControlDirectives {
    /// Response must not be stored.
    pub no_store: bool,
    /// Response must be revalidated before reuse.
    pub no_cache: bool,
    /// Response is specific to the authenticated caller.
    pub private: bool,
    /// Freshness lifetime in seconds.
    pub max_age: Option<u64>,
    /// Grace period after expiry during which the entry may still be served.
    pub stale_while_revalidate: Option<u64>,
}

/// Parse a Cache-Control header into directives.
///
/// Unknown directives and malformed values are ignored.
pub fn parse_cache_control(header: Option<&str>) -> CacheControlDirectives {
    let mut directives = CacheControlDirectives::default();

    let Some(header) = header else {
        return directives;
    };

    for token in header.split(',') {
        let token = token.trim().to_ascii_lowercase();

        match token.split_once('=') {
            None => match token.as_str() {
                "no-store" => directives.no_store = true,
                "no-cache" => directives.no_cache = true,
                "private" => directives.private = true,
                _ => {}
            },
            Some((name, value)) => {
                let Ok(seconds) = value.trim().parse::<u64>() else {
                    continue;
                };
                match name.trim() {
                    "max-age" => directives.max_age = Some(seconds),
                    "stale-while-revalidate" => directives.stale_while_revalidate = Some(seconds),
                    _ => {}
                }
            }
        }
    }

    directives
}

/// Build a cache entry for a response body.
///
/// Returns `None` when the response is not cacheable: `no-store` is present,
/// or the server gave no explicit `max-age`.
pub fn create_cache_entry(value: Value, cache_control_header: Option<&str>) -> Option<CacheEntry> {
    let cache_control = parse_cache_control(cache_control_header);
    if cache_control.no_store {
        return None;
    }
    let max_age = cache_control.max_age?;

    Some(CacheEntry {
        value,
        expires_at: now_secs().saturating_add(max_age),
        cache_control,
    })
}
