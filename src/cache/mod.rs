//! Response caching that respects Cache-Control headers.
//!
//! The client stores successful GET responses through the [`Cache`] trait.
//! [`MemoryCache`] is the bounded in-process default; implement the trait to
//! plug in a shared store.

mod control;
mod memory;

pub use control::{create_cache_entry, parse_cache_control, CacheControlDirectives};
pub use memory::MemoryCache;

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

/// Storage capability used by the client.
///
/// Implementations must be safe to call from many in-flight requests at once.
pub trait Cache: Send + Sync {
    /// Get a usable entry, or `None` if absent or expired.
    fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Store an entry.
    fn set(&self, key: &str, entry: CacheEntry);

    /// Remove an entry.
    fn delete(&self, key: &str);
}

/// A cached response body.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The decoded JSON response.
    pub value: Value,
    /// Unix timestamp (seconds) after which the entry is stale.
    pub expires_at: u64,
    /// Directives the entry was stored under.
    pub cache_control: CacheControlDirectives,
}

impl CacheEntry {
    /// True while `now` is before the expiry time.
    pub fn is_fresh(&self, now: u64) -> bool {
        now < self.expires_at
    }

    /// True if the entry may be served at `now`, fresh or within its
    /// stale-while-revalidate window.
    pub fn is_usable(&self, now: u64) -> bool {
        if self.is_fresh(now) {
            return true;
        }
        match self.cache_control.stale_while_revalidate {
            Some(swr) => now < self.expires_at.saturating_add(swr),
            None => false,
        }
    }
}

/// Build the cache key for a request: `METHOD:url[:auth_hash]`.
pub fn generate_cache_key(method: &str, url: &str, auth_hash: Option<&str>) -> String {
    let method = method.to_ascii_uppercase();
    match auth_hash {
        Some(hash) => format!("{method}:{url}:{hash}"),
        None => format!("{method}:{url}"),
    }
}

/// Fingerprint a credential: first 64 bits of its SHA-256, hex-encoded.
pub fn hash_string(s: &str) -> String {
    let digest = Sha256::digest(s.as_bytes());
    hex::encode(&digest[..8])
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(expires_at: u64, swr: Option<u64>) -> CacheEntry {
        CacheEntry {
            value: json!(null),
            expires_at,
            cache_control: CacheControlDirectives {
                max_age: Some(0),
                stale_while_revalidate: swr,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_generate_cache_key() {
        assert_eq!(
            generate_cache_key("get", "https://api.refyne.uk/api/v1/usage", Some("abcd")),
            "GET:https://api.refyne.uk/api/v1/usage:abcd"
        );
        assert_eq!(generate_cache_key("Post", "/x", None), "POST:/x");
    }

    #[test]
    fn test_hash_string() {
        let h1 = hash_string("test");
        assert_eq!(h1, hash_string("test"));
        assert_eq!(h1.len(), 16);
        assert_ne!(h1, hash_string("other"));
    }

    #[test]
    fn test_entry_freshness() {
        let e = entry(100, None);
        assert!(e.is_fresh(99));
        assert!(!e.is_fresh(100));
        assert!(!e.is_usable(100));

        let e = entry(100, Some(30));
        assert!(e.is_usable(100));
        assert!(e.is_usable(129));
        assert!(!e.is_usable(130));
    }
}
