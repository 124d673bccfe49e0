//! Token lifecycle: expiry checks, refresh, and the refresh buffer policy
//!
//! `TokenManager` drives one logical session through
//! `Absent -> Valid -> ExpiringSoon -> Refreshing -> Valid | Invalid`.
//! Every refresh runs while the session lock is held, so the foreground path,
//! the maintenance loop and explicit refreshes never send the same refresh
//! token twice. A session whose refresh token the backend rejected is dropped.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::holder::{SessionGuard, SessionHolder};
use super::model::{now_epoch_seconds, Session};
use super::strategy::RefreshStrategy;
use crate::api::RemoteAuthApi;
use crate::error::{AuthError, AuthResult};

/// Minimum length of a structurally plausible JWT
const MIN_TOKEN_LENGTH: usize = 50;

/// Observable state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No session stored
    Absent,
    /// Session present and outside the refresh buffer
    Valid,
    /// Session inside the refresh buffer or already expired
    ExpiringSoon,
    /// A refresh call is in flight
    Refreshing,
    /// The last refresh failed and the session was dropped
    Invalid,
}

/// Result of [`TokenManager::refresh_if_due`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No session, or the token is outside the refresh buffer
    NotDue,
    Refreshed,
    Failed,
}

/// Structural sanity check for a JWT: three non-empty dot-separated segments
/// and more than 50 characters overall. Does not verify signatures.
pub fn is_valid_token_format(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    token.len() > MIN_TOKEN_LENGTH && segments.len() == 3 && segments.iter().all(|s| !s.is_empty())
}

/// Counts a refresh as in flight until dropped, cancellation included
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Keeps the access token fresh
pub struct TokenManager {
    api: Arc<dyn RemoteAuthApi>,
    holder: Arc<SessionHolder>,
    strategy: Mutex<Box<dyn RefreshStrategy>>,
    in_flight: AtomicUsize,
    invalidated: AtomicBool,
}

impl TokenManager {
    pub fn new(
        api: Arc<dyn RemoteAuthApi>,
        holder: Arc<SessionHolder>,
        strategy: Box<dyn RefreshStrategy>,
    ) -> Self {
        Self {
            api,
            holder,
            strategy: Mutex::new(strategy),
            in_flight: AtomicUsize::new(0),
            invalidated: AtomicBool::new(false),
        }
    }

    /// Seconds before expiry at which the current strategy refreshes
    pub async fn buffer_seconds(&self) -> i64 {
        self.strategy.lock().await.buffer_seconds()
    }

    /// Returns a usable access token, refreshing it first if it is due
    ///
    /// Concurrent callers wait for the refresh in progress and then reuse the
    /// new token instead of refreshing again. Returns `None` when there is no
    /// session or the refresh failed; in the latter case the stored session
    /// is cleared.
    pub async fn get_valid_access_token(&self) -> Option<String> {
        let buffer = self.buffer_seconds().await;
        let mut guard = self.holder.lock().await;
        let session = guard.session()?.clone();

        if !session.needs_refresh_at(now_epoch_seconds(), buffer) {
            return Some(session.access_token);
        }

        debug!(expires_at = session.expires_at, buffer, "access token due for refresh");
        match self.refresh_locked(&mut guard, &session).await {
            Ok(()) => guard.session().map(|s| s.access_token.clone()),
            Err(_) => {
                self.drop_session(&mut guard).await;
                None
            }
        }
    }

    /// True iff the current session is due: `now >= expires_at - buffer_seconds`
    ///
    /// Returns false when there is no session.
    pub async fn needs_refresh(&self, buffer_seconds: i64) -> bool {
        self.holder
            .session()
            .await
            .map(|s| s.needs_refresh_at(now_epoch_seconds(), buffer_seconds))
            .unwrap_or(false)
    }

    /// Exchanges the refresh token for a new session now, due or not
    ///
    /// Calls the backend exactly once per invocation and reports failure as
    /// `false`. The session lock is held for the whole exchange. A rejected
    /// refresh token drops the session; a transient failure keeps it.
    pub async fn refresh_tokens(&self) -> bool {
        let mut guard = self.holder.lock().await;
        let Some(session) = guard.session().cloned() else {
            debug!("refresh requested without a session");
            return false;
        };
        self.refresh_or_settle(&mut guard, &session).await
    }

    /// Refreshes only if the session is inside the current refresh buffer
    ///
    /// Expiry is checked after the session lock is taken, so a refresh that
    /// another caller just completed is not repeated.
    pub async fn refresh_if_due(&self) -> RefreshOutcome {
        let buffer = self.buffer_seconds().await;
        let mut guard = self.holder.lock().await;
        let Some(session) = guard.session().cloned() else {
            return RefreshOutcome::NotDue;
        };
        if !session.needs_refresh_at(now_epoch_seconds(), buffer) {
            return RefreshOutcome::NotDue;
        }
        if self.refresh_or_settle(&mut guard, &session).await {
            RefreshOutcome::Refreshed
        } else {
            RefreshOutcome::Failed
        }
    }

    /// Current state of the session
    pub async fn state(&self) -> TokenState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            return TokenState::Refreshing;
        }
        let buffer = self.buffer_seconds().await;
        match self.holder.session().await {
            None if self.invalidated.load(Ordering::SeqCst) => TokenState::Invalid,
            None => TokenState::Absent,
            Some(s) if s.needs_refresh_at(now_epoch_seconds(), buffer) => TokenState::ExpiringSoon,
            Some(_) => TokenState::Valid,
        }
    }

    /// Clears the invalid marker after a fresh sign-in
    pub fn mark_authenticated(&self) {
        self.invalidated.store(false, Ordering::SeqCst);
    }

    /// Clears the invalid marker after an explicit sign-out
    pub fn mark_signed_out(&self) {
        self.invalidated.store(false, Ordering::SeqCst);
    }

    /// Refreshes and drops the session only if the backend rejected it
    async fn refresh_or_settle(&self, guard: &mut SessionGuard<'_>, session: &Session) -> bool {
        match self.refresh_locked(guard, session).await {
            Ok(()) => true,
            Err(AuthError::RefreshTokenInvalid | AuthError::SessionInvalid) => {
                self.drop_session(guard).await;
                false
            }
            Err(_) => false,
        }
    }

    async fn refresh_locked(&self, guard: &mut SessionGuard<'_>, session: &Session) -> AuthResult<()> {
        let new_session = self.call_refresh(session).await?;
        guard.replace(new_session).await.map_err(|e| {
            warn!(error = %e, "refreshed session could not be stored");
            AuthError::from(e)
        })
    }

    async fn drop_session(&self, guard: &mut SessionGuard<'_>) {
        self.invalidated.store(true, Ordering::SeqCst);
        if let Err(e) = guard.clear().await {
            warn!(error = %e, "failed to clear session after refresh failure");
        }
    }

    /// One call to the refresh grant, with strategy bookkeeping
    async fn call_refresh(&self, session: &Session) -> AuthResult<Session> {
        let result = {
            let _in_flight = InFlight::enter(&self.in_flight);
            self.api.refresh_session(&session.refresh_token).await
        };

        let mut strategy = self.strategy.lock().await;
        match result {
            Ok(new_session) => {
                strategy.record_success();
                self.invalidated.store(false, Ordering::SeqCst);
                info!(user_id = %new_session.user_id, "access token refreshed");
                Ok(new_session)
            }
            Err(e) => {
                strategy.record_failure();
                let err = AuthError::from(e);
                warn!(error = %err, next_buffer = strategy.buffer_seconds(), "token refresh failed");
                Err(err)
            }
        }
    }
}
