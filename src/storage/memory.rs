//! In-memory placeholder storage

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{SecureStorage, StorageError};
use crate::session::{Session, User};

const SESSION_KEY: &str = "session";
const PROFILE_KEY: &str = "profile";
const ONBOARDING_KEY: &str = "onboarding_completed";

/// Storage backed by a key/value map of JSON strings
///
/// Values are stored serialized so that reads exercise the same decode path
/// as the file-backed store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    async fn write<T: serde::Serialize>(&self, key: &str, value: Option<&T>) -> Result<(), StorageError> {
        let mut values = self.values.write().await;
        match value {
            Some(v) => {
                values.insert(key.to_string(), serde_json::to_string(v)?);
            }
            None => {
                values.remove(key);
            }
        }
        Ok(())
    }

    async fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let values = self.values.read().await;
        let raw = values.get(key)?;
        serde_json::from_str(raw).ok()
    }

    /// Stores a raw value under `key`; lets tests plant corrupt data
    #[cfg(test)]
    pub(crate) async fn insert_raw(&self, key: &str, raw: &str) {
        self.values.write().await.insert(key.to_string(), raw.to_string());
    }
}

#[async_trait]
impl SecureStorage for MemoryStorage {
    async fn save_session(&self, session: Option<&Session>) -> Result<(), StorageError> {
        self.write(SESSION_KEY, session).await
    }

    async fn get_session(&self) -> Option<Session> {
        self.read(SESSION_KEY).await
    }

    async fn is_onboarding_completed(&self) -> bool {
        self.read(ONBOARDING_KEY).await.unwrap_or(false)
    }

    async fn set_onboarding_completed(&self, completed: bool) -> Result<(), StorageError> {
        self.write(ONBOARDING_KEY, Some(&completed)).await
    }

    async fn get_profile(&self) -> Option<User> {
        self.read(PROFILE_KEY).await
    }

    async fn save_profile(&self, profile: Option<&User>) -> Result<(), StorageError> {
        self.write(PROFILE_KEY, profile).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            access_token: "a.b.c".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: 1_700_000_000,
            user_id: "user-1".to_string(),
            user: None,
        }
    }

    #[tokio::test]
    async fn test_save_then_get_session_roundtrip() {
        let storage = MemoryStorage::new();
        storage.save_session(Some(&session())).await.expect("Save should succeed");
        assert_eq!(storage.get_session().await, Some(session()));
    }

    #[tokio::test]
    async fn test_clear_session_twice_is_noop() {
        let storage = MemoryStorage::new();
        storage.save_session(Some(&session())).await.expect("Save should succeed");

        storage.clear_session().await.expect("First clear should succeed");
        storage.clear_session().await.expect("Second clear should succeed");

        assert!(storage.get_session().await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_session_reads_as_none() {
        let storage = MemoryStorage::new();
        storage.insert_raw(SESSION_KEY, "{\"access_token\":").await;
        assert!(storage.get_session().await.is_none());
    }

    #[tokio::test]
    async fn test_onboarding_flag_defaults_to_false() {
        let storage = MemoryStorage::new();
        assert!(!storage.is_onboarding_completed().await);
        storage.set_onboarding_completed(true).await.expect("Save should succeed");
        assert!(storage.is_onboarding_completed().await);
    }
}
