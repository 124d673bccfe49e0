//! Secure on-device storage
//!
//! The durable copy of the session lives here; the session holder keeps a
//! short-lived in-memory mirror. Reads never fail: any read or decode problem
//! is reported as `None`. Writes are last-write-wins and idempotent.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use thiserror::Error;

use crate::session::{Session, User};

/// Errors that can occur when writing to storage
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem write failed
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be encoded
    #[error("storage encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Secure storage for session state and small user preferences
#[async_trait]
pub trait SecureStorage: Send + Sync {
    /// Persists the session, or removes it when `None`
    async fn save_session(&self, session: Option<&Session>) -> Result<(), StorageError>;

    /// Loads the stored session; `None` if absent or unreadable
    async fn get_session(&self) -> Option<Session>;

    /// Removes the stored session; no-op if there is none
    async fn clear_session(&self) -> Result<(), StorageError> {
        self.save_session(None).await
    }

    /// Whether the user has finished onboarding
    async fn is_onboarding_completed(&self) -> bool;

    async fn set_onboarding_completed(&self, completed: bool) -> Result<(), StorageError>;

    /// Last known user profile
    async fn get_profile(&self) -> Option<User>;

    async fn save_profile(&self, profile: Option<&User>) -> Result<(), StorageError>;
}
