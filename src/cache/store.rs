//! In-memory TTL store holding serialized snapshots
//!
//! Entries are serialized to JSON on write and decoded on read. Expiry is lazy:
//! an expired entry is evicted by the read that discovers it, and `cleanup()`
//! sweeps the rest in one pass. The store is not internally synchronized.

use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

/// Errors that can occur when writing to the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// The value could not be serialized
    #[error("Failed to serialize cache value: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The invalidation pattern could not be compiled
    #[error("Invalid invalidation pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A serialized value with its write time and time-to-live
#[derive(Debug, Clone)]
struct CacheEntry {
    /// JSON snapshot of the cached value
    payload: String,
    /// When the entry was written
    written_at: Instant,
    /// How long the entry stays valid, fixed at write time
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.written_at) > self.ttl
    }
}

/// Key to serialized-value map with per-entry expiry
#[derive(Debug, Default)]
pub struct TtlStore {
    entries: HashMap<String, CacheEntry>,
}

impl TtlStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes and stores a value, replacing any existing entry for `key`
    ///
    /// # Arguments
    /// * `key` - Cache key (e.g., "invoice_42")
    /// * `value` - The value to snapshot
    /// * `ttl` - How long the entry stays valid
    pub fn put<T: Serialize>(&mut self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError> {
        let payload = serde_json::to_string(value)?;
        self.put_raw(key, payload, ttl);
        Ok(())
    }

    /// Stores an already-serialized payload
    pub fn put_raw(&mut self, key: &str, payload: String, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                payload,
                written_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Reads and decodes a value
    ///
    /// Returns `None` if the key is missing or expired. An entry that fails to
    /// decode is treated as corrupt: it is evicted and reported as a miss.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let payload = self.get_raw(key)?;
        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, error = %e, "evicting undecodable cache entry");
                self.entries.remove(key);
                None
            }
        }
    }

    /// Reads the raw payload, evicting it if it has expired
    pub fn get_raw(&mut self, key: &str) -> Option<String> {
        if !self.is_valid(key) {
            return None;
        }
        self.entries.get(key).map(|entry| entry.payload.clone())
    }

    /// Returns true if the key is present and not expired
    ///
    /// Performs the same lazy eviction as `get`.
    pub fn is_valid(&mut self, key: &str) -> bool {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                self.entries.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Removes a single entry; no-op if absent
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every key matching a simple glob where `*` matches any run of characters
    ///
    /// Matching is case-sensitive and anchored at both ends.
    ///
    /// # Returns
    /// The number of entries removed (zero is not an error)
    pub fn invalidate_pattern(&mut self, pattern: &str) -> Result<usize, CacheError> {
        let matcher = glob_to_regex(pattern)?;
        let before = self.entries.len();
        self.entries.retain(|key, _| !matcher.is_match(key));
        Ok(before - self.entries.len())
    }

    /// Drops every entry
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Removes all currently-expired entries in one pass
    ///
    /// # Returns
    /// The number of entries removed
    pub fn cleanup(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - self.entries.len();
        debug!(removed, remaining = self.entries.len(), "cache cleanup");
        removed
    }

    /// Number of stored entries, including expired ones not yet swept
    ///
    /// This is an approximation: `get`/`is_valid` treat expired entries as
    /// absent while `size` keeps counting them until they are evicted.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Approximate memory held by keys and payloads, in bytes
    pub fn estimated_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|(key, entry)| key.len() + entry.payload.len())
            .sum()
    }
}

/// Translates a glob (`*` wildcard) into an anchored regex
fn glob_to_regex(pattern: &str) -> Result<Regex, CacheError> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{}$", body)).map_err(|source| CacheError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Invoice {
        number: String,
        total_cents: i64,
    }

    fn invoice(number: &str) -> Invoice {
        Invoice {
            number: number.to_string(),
            total_cents: 12_500,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_returns_value_until_ttl_elapses() {
        let mut store = TtlStore::new();
        store
            .put("invoice_1", &invoice("INV-1"), Duration::from_secs(60))
            .expect("Put should succeed");

        assert_eq!(store.get::<Invoice>("invoice_1"), Some(invoice("INV-1")));

        tokio::time::advance(Duration::from_secs(61)).await;

        assert_eq!(store.get::<Invoice>("invoice_1"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_size_counts_expired_entries_until_swept() {
        let mut store = TtlStore::new();
        store.put_raw("a", "1".to_string(), Duration::from_secs(10));
        store.put_raw("b", "2".to_string(), Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(11)).await;

        // Not yet observed: still counted
        assert_eq!(store.size(), 2);

        // A read on "a" evicts only "a"
        assert!(store.get_raw("a").is_none());
        assert_eq!(store.size(), 1);

        assert_eq!(store.cleanup(), 1);
        assert_eq!(store.size(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_at_exact_ttl_is_still_valid() {
        let mut store = TtlStore::new();
        store.put_raw("k", "v".to_string(), Duration::from_secs(5));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(store.is_valid("k"));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!store.is_valid("k"));
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn test_put_overwrites_existing_entry() {
        let mut store = TtlStore::new();
        store
            .put("k", &invoice("first"), Duration::from_secs(60))
            .expect("Put should succeed");
        store
            .put("k", &invoice("second"), Duration::from_secs(60))
            .expect("Put should succeed");

        assert_eq!(store.get::<Invoice>("k"), Some(invoice("second")));
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn test_decode_failure_evicts_entry() {
        let mut store = TtlStore::new();
        store.put_raw("bad", "{not json".to_string(), Duration::from_secs(60));

        assert_eq!(store.get::<Invoice>("bad"), None);
        assert_eq!(store.size(), 0, "Corrupt entry should be evicted");
    }

    #[test]
    fn test_invalidate_missing_key_is_noop() {
        let mut store = TtlStore::new();
        assert!(!store.invalidate("missing"));
        store.put_raw("present", "1".to_string(), Duration::from_secs(60));
        assert!(store.invalidate("present"));
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn test_invalidate_pattern_removes_only_matching_prefix() {
        let mut store = TtlStore::new();
        let ttl = Duration::from_secs(300);
        for key in ["feature_a", "feature_b", "feature_", "other_a", "my_feature_a", "Feature_c"] {
            store.put_raw(key, "x".to_string(), ttl);
        }

        let removed = store.invalidate_pattern("feature_*").expect("Pattern should compile");

        assert_eq!(removed, 3);
        assert!(store.get_raw("other_a").is_some());
        assert!(store.get_raw("my_feature_a").is_some());
        assert!(store.get_raw("Feature_c").is_some(), "Matching is case-sensitive");
        assert!(store.get_raw("feature_a").is_none());
    }

    #[test]
    fn test_invalidate_pattern_escapes_regex_metacharacters() {
        let mut store = TtlStore::new();
        let ttl = Duration::from_secs(300);
        store.put_raw("a.b_1", "x".to_string(), ttl);
        store.put_raw("axb_1", "x".to_string(), ttl);

        assert_eq!(store.invalidate_pattern("a.b_*").expect("Pattern should compile"), 1);
        assert!(store.get_raw("axb_1").is_some());
    }

    #[test]
    fn test_invalidate_pattern_with_no_matches() {
        let mut store = TtlStore::new();
        store.put_raw("contact_1", "x".to_string(), Duration::from_secs(300));
        assert_eq!(store.invalidate_pattern("invoice_*").expect("Pattern should compile"), 0);
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn test_pattern_invalidation_scenario() {
        let mut store = TtlStore::new();
        store
            .put("a_1", &invoice("x"), Duration::from_secs(300))
            .expect("Put should succeed");
        store.invalidate_pattern("a_*").expect("Pattern should compile");
        assert_eq!(store.get::<Invoice>("a_1"), None);
    }

    #[test]
    fn test_estimated_bytes_counts_keys_and_payloads() {
        let mut store = TtlStore::new();
        store.put_raw("abc", "12345".to_string(), Duration::from_secs(60));
        assert_eq!(store.estimated_bytes(), 8);
        store.clear_all();
        assert_eq!(store.estimated_bytes(), 0);
    }
}
