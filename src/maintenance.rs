//! Background maintenance loop
//!
//! Sweeps expired cache entries and refreshes the access token ahead of
//! expiry on a fixed interval, reporting what happened over a tokio channel.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::cache::SharedCache;
use crate::config::MaintenanceConfig;
use crate::session::{RefreshOutcome, TokenManager};

/// Messages sent from the maintenance loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaintenanceMessage {
    /// A maintenance pass started
    PassStarted,
    /// Expired cache entries were swept
    CacheSwept(usize),
    /// The access token was refreshed ahead of expiry
    TokenRefreshed,
    /// A proactive refresh failed; a rejected refresh token also drops the session
    TokenRefreshFailed,
    /// A maintenance pass completed
    PassCompleted,
}

/// Handle for controlling the maintenance loop
pub struct MaintenanceHandle {
    /// Channel for receiving maintenance messages
    pub receiver: mpsc::Receiver<MaintenanceMessage>,
    /// Flag to signal shutdown
    shutdown_tx: mpsc::Sender<()>,
}

/// Runs one maintenance pass and returns what happened
///
/// Cache sweep first, then a token refresh if the current strategy says
/// the token is due. The refresh takes the session lock, so it never races a
/// foreground caller refreshing the same token.
pub async fn run_pass(cache: &SharedCache, tokens: &TokenManager) -> Vec<MaintenanceMessage> {
    let mut messages = Vec::new();

    let swept = cache.lock().await.perform_maintenance();
    if swept > 0 {
        messages.push(MaintenanceMessage::CacheSwept(swept));
    }

    match tokens.refresh_if_due().await {
        RefreshOutcome::NotDue => {}
        RefreshOutcome::Refreshed => messages.push(MaintenanceMessage::TokenRefreshed),
        RefreshOutcome::Failed => messages.push(MaintenanceMessage::TokenRefreshFailed),
    }

    messages
}

impl MaintenanceHandle {
    /// Spawns the maintenance loop
    ///
    /// # Arguments
    /// * `config` - Interval and on/off switch
    /// * `cache` - Cache to sweep
    /// * `tokens` - Token manager to keep fresh
    ///
    /// # Returns
    /// A MaintenanceHandle that receives updates via the `receiver` channel
    pub fn spawn(config: MaintenanceConfig, cache: SharedCache, tokens: Arc<TokenManager>) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled {
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(config.interval);
                // Skip the first tick (immediate)
                interval.tick().await;

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let _ = msg_tx.send(MaintenanceMessage::PassStarted).await;
                            for message in run_pass(&cache, &tokens).await {
                                debug!(?message, "maintenance");
                                let _ = msg_tx.send(message).await;
                            }
                            let _ = msg_tx.send(MaintenanceMessage::PassCompleted).await;
                        }
                        _ = shutdown_rx.recv() => {
                            break;
                        }
                    }
                }
            });
        }

        Self {
            receiver: msg_rx,
            shutdown_tx,
        }
    }

    /// Checks for a pending message without blocking
    pub fn try_recv(&mut self) -> Option<MaintenanceMessage> {
        self.receiver.try_recv().ok()
    }

    /// Shuts down the maintenance loop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, RemoteAuthApi, UserUpdate};
    use crate::cache::{CacheManager, TtlClass};
    use crate::session::{now_epoch_seconds, Aggressive, Session, SessionHolder, TokenState, User};
    use crate::storage::{MemoryStorage, SecureStorage};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// Auth API whose refresh grant always succeeds
    struct RefreshingApi;

    #[async_trait]
    impl RemoteAuthApi for RefreshingApi {
        async fn sign_up(&self, _: &str, _: &str, _: Option<&str>) -> Result<Session, ApiError> {
            unimplemented!()
        }

        async fn sign_in_with_password(&self, _: &str, _: &str) -> Result<Session, ApiError> {
            unimplemented!()
        }

        async fn refresh_session(&self, _: &str) -> Result<Session, ApiError> {
            Ok(session(now_epoch_seconds() + 3600))
        }

        async fn sign_out(&self, _: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn update_user(&self, _: &str, _: &UserUpdate) -> Result<User, ApiError> {
            unimplemented!()
        }

        async fn recover_password(&self, _: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn resend_verification(&self, _: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn verify_email(&self, _: &str, _: &str) -> Result<Session, ApiError> {
            unimplemented!()
        }
    }

    fn session(expires_at: i64) -> Session {
        Session {
            access_token: format!("token-{}", expires_at),
            refresh_token: "refresh".to_string(),
            expires_at,
            user_id: "user-1".to_string(),
            user: None,
        }
    }

    /// Auth API that rotates refresh tokens and rejects any token used twice
    #[derive(Default)]
    struct RotatingApi {
        used: std::sync::Mutex<HashSet<String>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteAuthApi for RotatingApi {
        async fn sign_up(&self, _: &str, _: &str, _: Option<&str>) -> Result<Session, ApiError> {
            unimplemented!()
        }

        async fn sign_in_with_password(&self, _: &str, _: &str) -> Result<Session, ApiError> {
            unimplemented!()
        }

        async fn refresh_session(&self, refresh_token: &str) -> Result<Session, ApiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let first_use = self
                .used
                .lock()
                .expect("Lock should not be poisoned")
                .insert(refresh_token.to_string());
            tokio::time::sleep(Duration::from_millis(100)).await;
            if !first_use {
                return Err(ApiError::Status {
                    status: 400,
                    message: "Invalid Refresh Token: Already Used".to_string(),
                });
            }
            Ok(Session {
                refresh_token: format!("refresh-{}", n),
                ..session(now_epoch_seconds() + 3600)
            })
        }

        async fn sign_out(&self, _: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn update_user(&self, _: &str, _: &UserUpdate) -> Result<User, ApiError> {
            unimplemented!()
        }

        async fn recover_password(&self, _: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn resend_verification(&self, _: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn verify_email(&self, _: &str, _: &str) -> Result<Session, ApiError> {
            unimplemented!()
        }
    }

    async fn fixture_with(
        api: Arc<dyn RemoteAuthApi>,
        stored: Option<Session>,
    ) -> (SharedCache, Arc<TokenManager>) {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .save_session(stored.as_ref())
            .await
            .expect("Seed should succeed");
        let holder = Arc::new(SessionHolder::new(storage));
        let tokens = Arc::new(TokenManager::new(api, holder, Box::new(Aggressive)));
        (Arc::new(Mutex::new(CacheManager::new())), tokens)
    }

    async fn fixture(stored: Option<Session>) -> (SharedCache, Arc<TokenManager>) {
        fixture_with(Arc::new(RefreshingApi), stored).await
    }

    #[test]
    fn test_maintenance_config_custom() {
        let config = MaintenanceConfig {
            interval: Duration::from_secs(60),
            enabled: false,
        };
        assert_eq!(config.interval, Duration::from_secs(60));
        assert!(!config.enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_pass_sweeps_and_refreshes() {
        let (cache, tokens) = fixture(Some(session(now_epoch_seconds() + 60))).await;
        cache
            .lock()
            .await
            .put("invoice_1", &1, TtlClass::UserData)
            .expect("Put should succeed");
        tokio::time::advance(TtlClass::UserData.ttl() + Duration::from_secs(1)).await;

        let messages = run_pass(&cache, &tokens).await;

        assert_eq!(
            messages,
            vec![MaintenanceMessage::CacheSwept(1), MaintenanceMessage::TokenRefreshed]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_pass_and_foreground_refresh_do_not_race() {
        let api = Arc::new(RotatingApi::default());
        let (cache, tokens) = fixture_with(api.clone(), Some(session(now_epoch_seconds() + 60))).await;

        let (messages, token) = tokio::join!(run_pass(&cache, &tokens), tokens.get_valid_access_token());

        assert!(token.is_some(), "Foreground caller should get the refreshed token");
        assert!(!messages.contains(&MaintenanceMessage::TokenRefreshFailed));
        assert_eq!(api.calls.load(Ordering::SeqCst), 1, "One refresh for both callers");
        assert_eq!(tokens.state().await, TokenState::Valid);
    }

    #[tokio::test]
    async fn test_run_pass_is_quiet_when_nothing_to_do() {
        let (cache, tokens) = fixture(Some(session(now_epoch_seconds() + 3600))).await;
        assert!(run_pass(&cache, &tokens).await.is_empty());
    }

    #[tokio::test]
    async fn test_spawn_disabled_sends_nothing() {
        let (cache, tokens) = fixture(None).await;
        let config = MaintenanceConfig {
            enabled: false,
            ..Default::default()
        };

        let mut handle = MaintenanceHandle::spawn(config, cache, tokens);

        assert!(handle.try_recv().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_runs_pass_on_each_tick() {
        let (cache, tokens) = fixture(None).await;
        let config = MaintenanceConfig {
            interval: Duration::from_secs(10),
            enabled: true,
        };

        let mut handle = MaintenanceHandle::spawn(config, cache, tokens);

        assert_eq!(handle.receiver.recv().await, Some(MaintenanceMessage::PassStarted));
        assert_eq!(handle.receiver.recv().await, Some(MaintenanceMessage::PassCompleted));
        handle.shutdown().await;
    }
}
