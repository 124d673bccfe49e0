//! Cache manager façade
//!
//! Provides a `CacheManager` that is the only cache surface the rest of the
//! client talks to. It owns the invalidation coordinator (and through it the
//! store) and exposes lifecycle entry points: initialisation, periodic
//! maintenance, logout and data-update hooks, and stats.

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::invalidation::{CacheInvalidator, InvalidationEvent};
use super::keys::{CacheKey, TtlClass};
use super::store::CacheError;

/// Point-in-time view of the cache
///
/// Not atomic with respect to concurrent writers; `entry_count` includes
/// expired entries that have not been swept yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Number of stored entries
    pub entry_count: usize,
    /// Approximate bytes held by keys and payloads
    pub estimated_bytes: usize,
}

/// Lifecycle façade over the invalidation coordinator
///
/// The manager has no timer of its own: the caller decides how often
/// [`CacheManager::perform_maintenance`] runs (see `maintenance::MaintenanceHandle`).
#[derive(Debug, Default)]
pub struct CacheManager {
    invalidator: CacheInvalidator,
}

impl CacheManager {
    /// Creates a manager over an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one cleanup pass
    pub fn initialize(&mut self) {
        let removed = self.invalidator.cleanup_expired_entries();
        debug!(removed, "cache initialized");
    }

    /// Recurring maintenance entry point
    ///
    /// # Returns
    /// The number of expired entries swept
    pub fn perform_maintenance(&mut self) -> usize {
        self.invalidator.cleanup_expired_entries()
    }

    /// Reads a cached value, treating expired or corrupt entries as misses
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        self.invalidator.get(key)
    }

    /// Caches a value with the TTL of its class
    ///
    /// # Arguments
    /// * `key` - Cache key, usually built with [`CacheKey`]
    /// * `value` - The value to snapshot
    /// * `class` - Determines the entry's time-to-live
    pub fn put<T: Serialize>(&mut self, key: &str, value: &T, class: TtlClass) -> Result<(), CacheError> {
        self.invalidator.put(key, value, class.ttl())
    }

    /// Drops every key of a feature area without a refresh signal
    pub fn clear_feature_cache(&mut self, feature: &str) {
        if let Err(e) = self
            .invalidator
            .invalidate_pattern(&CacheKey::feature_pattern(feature))
        {
            warn!(feature, error = %e, "failed to clear feature cache");
        }
    }

    /// Drops a feature area and tells subscribers to reload it
    pub fn force_refresh(&mut self, feature: &str) {
        if let Err(e) = self.invalidator.on_manual_refresh(feature) {
            warn!(feature, error = %e, "failed to force refresh");
        }
    }

    /// Returns a snapshot of the current cache size
    pub fn get_cache_stats(&self) -> CacheStats {
        let store = self.invalidator.store();
        CacheStats {
            entry_count: store.size(),
            estimated_bytes: store.estimated_bytes(),
        }
    }

    /// Clears all cached data after the user signs out
    pub fn handle_user_logout(&mut self) {
        self.invalidator.on_user_logout();
    }

    /// Drops cached copies of a record that changed
    pub fn handle_data_update(&mut self, data_type: &str, id: &str) {
        if let Err(e) = self.invalidator.on_data_updated(data_type, id) {
            warn!(data_type, id, error = %e, "failed to invalidate updated data");
        }
    }

    /// Subscribes to invalidation events
    pub fn subscribe(&self) -> broadcast::Receiver<InvalidationEvent> {
        self.invalidator.subscribe()
    }
}
