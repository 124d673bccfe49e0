//! Lazily loaded, lock-guarded session mirror
//!
//! `SessionHolder` keeps the one in-memory copy of the session behind a single
//! `tokio::sync::Mutex`. The first accessor reads through to secure storage
//! while holding the lock, so concurrent accessors wait for that same load
//! instead of issuing their own storage reads. The access-token, owner-id and
//! session providers all go through this lock and therefore always agree.
//!
//! Guards are released on drop, including when the awaiting task is cancelled.

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use super::model::Session;
use crate::storage::{SecureStorage, StorageError};

#[derive(Debug, Default)]
struct SessionSlot {
    /// Whether storage has been read since the last reset
    loaded: bool,
    session: Option<Session>,
}

/// Exclusive access to the cached session
///
/// Holding a guard serializes with every other session accessor. Callers that
/// need a read-refresh-write sequence to be single-flight keep the guard for
/// the whole sequence.
pub struct SessionGuard<'a> {
    storage: &'a dyn SecureStorage,
    slot: MutexGuard<'a, SessionSlot>,
}

impl<'a> SessionGuard<'a> {
    /// The current session, if any
    pub fn session(&self) -> Option<&Session> {
        self.slot.session.as_ref()
    }

    /// Replaces the session, writing through to storage first
    ///
    /// The in-memory copy only changes once storage accepted the write.
    pub async fn replace(&mut self, session: Session) -> Result<(), StorageError> {
        self.storage.save_session(Some(&session)).await?;
        info!(user_id = %session.user_id, expires_at = session.expires_at, "session stored");
        self.slot.session = Some(session);
        Ok(())
    }

    /// Drops the session from memory and storage
    ///
    /// The in-memory copy is cleared even if the storage write fails.
    pub async fn clear(&mut self) -> Result<(), StorageError> {
        let had_session = self.slot.session.take().is_some();
        if had_session {
            info!("session cleared");
        }
        self.storage.clear_session().await
    }
}

/// Owner of the single in-memory session
pub struct SessionHolder {
    storage: Arc<dyn SecureStorage>,
    slot: Mutex<SessionSlot>,
}

impl SessionHolder {
    /// Creates a holder that loads from `storage` on first access
    pub fn new(storage: Arc<dyn SecureStorage>) -> Self {
        Self {
            storage,
            slot: Mutex::new(SessionSlot::default()),
        }
    }

    /// Acquires the session lock, loading from storage on first use
    pub async fn lock(&self) -> SessionGuard<'_> {
        let mut slot = self.slot.lock().await;
        if !slot.loaded {
            slot.session = self.storage.get_session().await;
            slot.loaded = true;
            debug!(present = slot.session.is_some(), "session loaded from storage");
        }
        SessionGuard {
            storage: self.storage.as_ref(),
            slot,
        }
    }

    /// Snapshot of the current session
    pub async fn session(&self) -> Option<Session> {
        self.lock().await.session().cloned()
    }

    /// Access token of the current session
    pub async fn access_token(&self) -> Option<String> {
        self.lock().await.session().map(|s| s.access_token.clone())
    }

    /// Id of the user owning the current session
    pub async fn owner_id(&self) -> Option<String> {
        self.lock().await.session().map(|s| s.user_id.clone())
    }

    /// Stores a new session
    pub async fn set(&self, session: Session) -> Result<(), StorageError> {
        self.lock().await.replace(session).await
    }

    /// Removes the session; calling it twice is harmless
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.lock().await.clear().await
    }

    /// Forgets the in-memory copy so the next access reloads from storage
    pub async fn reset(&self) {
        let mut slot = self.slot.lock().await;
        *slot = SessionSlot::default();
    }
}
