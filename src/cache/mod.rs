//! Cache module for holding API results in memory
//!
//! This module provides a TTL store, an invalidation coordinator that broadcasts
//! what was dropped, and a cache manager façade that the rest of the client uses.
//! Expiry is lazy; the manager's maintenance pass sweeps what reads never touch.

mod invalidation;
mod keys;
mod manager;
mod store;

pub use invalidation::{CacheInvalidator, InvalidationEvent};
pub use keys::{CacheKey, TtlClass};
pub use manager::{CacheManager, CacheStats};
pub use store::{CacheError, TtlStore};

/// Cache manager shared between the auth layer and the maintenance loop
///
/// The store is not synchronized itself; every user goes through this lock.
pub type SharedCache = std::sync::Arc<tokio::sync::Mutex<CacheManager>>;
