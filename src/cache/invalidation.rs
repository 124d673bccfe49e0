//! Invalidation coordinator
//!
//! Wraps the [`TtlStore`] and broadcasts an [`InvalidationEvent`] after every
//! mutation. The stream is fan-out only: subscribers that attach after an
//! event was sent never see it, and sending with no subscribers is not an error.

use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::keys::CacheKey;
use super::store::{CacheError, TtlStore};

/// Capacity of the broadcast channel; slow subscribers lag past this
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Signals emitted when cached data is dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationEvent {
    /// A single key was removed
    KeyInvalidated(String),
    /// Every key matching the glob was removed
    PatternInvalidated(String),
    /// The whole cache was cleared because the user signed out
    UserLogout,
    /// A feature area was force-refreshed
    ManualRefresh(String),
    /// Expired entries were swept
    ExpiredCleanup(usize),
    /// A record changed on the backend
    DataUpdated { data_type: String, id: String },
}

/// Store wrapper that reports invalidations to subscribers
#[derive(Debug)]
pub struct CacheInvalidator {
    store: TtlStore,
    events: broadcast::Sender<InvalidationEvent>,
}

impl Default for CacheInvalidator {
    fn default() -> Self {
        Self::new(TtlStore::new())
    }
}

impl CacheInvalidator {
    /// Wraps an existing store
    pub fn new(store: TtlStore) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { store, events }
    }

    /// Attaches a new subscriber; it only receives events sent from now on
    pub fn subscribe(&self) -> broadcast::Receiver<InvalidationEvent> {
        self.events.subscribe()
    }

    /// Read-only access to the wrapped store
    pub fn store(&self) -> &TtlStore {
        &self.store
    }

    /// Reads a live entry, evicting it if expired or undecodable; emits nothing
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        self.store.get(key)
    }

    /// Writes through to the store without emitting an event
    pub fn put<T: Serialize>(&mut self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError> {
        self.store.put(key, value, ttl)
    }

    /// Whether `key` holds a live entry
    pub fn is_valid(&mut self, key: &str) -> bool {
        self.store.is_valid(key)
    }

    /// Removes a key and emits `KeyInvalidated`
    pub fn invalidate(&mut self, key: &str) {
        self.store.invalidate(key);
        self.emit(InvalidationEvent::KeyInvalidated(key.to_string()));
    }

    /// Removes every key matching `pattern` and emits `PatternInvalidated`
    ///
    /// # Returns
    /// The number of entries removed
    pub fn invalidate_pattern(&mut self, pattern: &str) -> Result<usize, CacheError> {
        let removed = self.store.invalidate_pattern(pattern)?;
        debug!(pattern, removed, "pattern invalidated");
        self.emit(InvalidationEvent::PatternInvalidated(pattern.to_string()));
        Ok(removed)
    }

    /// Drops the record's own key and every list of its type
    pub fn on_data_updated(&mut self, data_type: &str, id: &str) -> Result<(), CacheError> {
        self.invalidate(&CacheKey::item(data_type, id));
        self.invalidate_pattern(&CacheKey::list_pattern(data_type))?;
        self.emit(InvalidationEvent::DataUpdated {
            data_type: data_type.to_string(),
            id: id.to_string(),
        });
        Ok(())
    }

    /// Drops every key of a feature area
    pub fn on_manual_refresh(&mut self, feature: &str) -> Result<(), CacheError> {
        self.invalidate_pattern(&CacheKey::feature_pattern(feature))?;
        self.emit(InvalidationEvent::ManualRefresh(feature.to_string()));
        Ok(())
    }

    /// Clears the entire cache, shared reference data included
    pub fn on_user_logout(&mut self) {
        let dropped = self.store.size();
        self.store.clear_all();
        info!(dropped, "cache cleared on logout");
        self.emit(InvalidationEvent::UserLogout);
    }

    /// Sweeps expired entries; emits `ExpiredCleanup` only when something was removed
    pub fn cleanup_expired_entries(&mut self) -> usize {
        let removed = self.store.cleanup();
        if removed > 0 {
            self.emit(InvalidationEvent::ExpiredCleanup(removed));
        }
        removed
    }

    fn emit(&self, event: InvalidationEvent) {
        // Err only means nobody is listening
        let _ = self.events.send(event);
    }
}
