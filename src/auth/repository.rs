//! Auth repository: the boundary where API and storage failures become `AuthError`
//!
//! Every method returns `AuthResult`; no infrastructure error escapes as-is.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{ProfileData, RemoteAuthApi, UserUpdate};
use crate::cache::{CacheKey, SharedCache, TtlClass};
use crate::error::{AuthError, AuthResult};
use crate::session::{Session, SessionHolder, TokenManager, User, UserSession};
use crate::storage::SecureStorage;

/// Cache data type for the signed-in user's profile
const PROFILE_CACHE_TYPE: &str = "profile";

/// Account operations used by the auth use cases
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<UserSession>;

    async fn sign_up(&self, email: &str, password: &str, full_name: Option<&str>) -> AuthResult<UserSession>;

    /// Ends the session locally even if the backend cannot be reached
    async fn sign_out(&self) -> AuthResult<()>;

    /// Re-authenticates with `current` before setting `new`
    async fn change_password(&self, current: &str, new: &str) -> AuthResult<()>;

    async fn send_password_reset(&self, email: &str) -> AuthResult<()>;

    async fn resend_verification(&self, email: &str) -> AuthResult<()>;

    async fn verify_email(&self, email: &str, code: &str) -> AuthResult<UserSession>;

    async fn update_profile(&self, profile: ProfileData) -> AuthResult<User>;

    /// The signed-in user, refreshing the token if it is due
    async fn current_session(&self) -> AuthResult<Option<UserSession>>;
}

/// Repository backed by the remote API, secure storage and the session holder
pub struct SessionAuthRepository {
    api: Arc<dyn RemoteAuthApi>,
    storage: Arc<dyn SecureStorage>,
    holder: Arc<SessionHolder>,
    tokens: Arc<TokenManager>,
    cache: SharedCache,
}

impl SessionAuthRepository {
    pub fn new(
        api: Arc<dyn RemoteAuthApi>,
        storage: Arc<dyn SecureStorage>,
        holder: Arc<SessionHolder>,
        tokens: Arc<TokenManager>,
        cache: SharedCache,
    ) -> Self {
        Self {
            api,
            storage,
            holder,
            tokens,
            cache,
        }
    }

    /// Stores a freshly issued session and caches its profile
    async fn establish(&self, session: Session) -> AuthResult<UserSession> {
        self.holder.set(session.clone()).await?;
        self.tokens.mark_authenticated();
        if let Some(user) = &session.user {
            self.remember_profile(user).await;
        }
        info!(user_id = %session.user_id, "signed in");
        Ok(session.to_user_session())
    }

    async fn remember_profile(&self, user: &User) {
        if let Err(e) = self.storage.save_profile(Some(user)).await {
            warn!(error = %e, "failed to persist profile");
        }
        let key = CacheKey::item(PROFILE_CACHE_TYPE, &user.id);
        if let Err(e) = self.cache.lock().await.put(&key, user, TtlClass::UserData) {
            warn!(error = %e, "failed to cache profile");
        }
    }

    async fn require_access_token(&self) -> AuthResult<String> {
        self.tokens
            .get_valid_access_token()
            .await
            .ok_or(AuthError::SessionInvalid)
    }

    /// Email of the signed-in user, from the session or the stored profile
    async fn current_email(&self) -> AuthResult<String> {
        let session = self.holder.session().await.ok_or(AuthError::SessionInvalid)?;
        if let Some(email) = session.user.map(|u| u.email).filter(|e| !e.is_empty()) {
            return Ok(email);
        }
        self.storage
            .get_profile()
            .await
            .filter(|p| p.id == session.user_id && !p.email.is_empty())
            .map(|p| p.email)
            .ok_or(AuthError::SessionInvalid)
    }
}

#[async_trait]
impl AuthRepository for SessionAuthRepository {
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<UserSession> {
        let session = self.api.sign_in_with_password(email.trim(), password).await?;
        self.establish(session).await
    }

    async fn sign_up(&self, email: &str, password: &str, full_name: Option<&str>) -> AuthResult<UserSession> {
        let session = self.api.sign_up(email.trim(), password, full_name).await?;
        self.establish(session).await
    }

    async fn sign_out(&self) -> AuthResult<()> {
        if let Some(token) = self.holder.access_token().await {
            if let Err(e) = self.api.sign_out(&token).await {
                warn!(error = %e, "remote sign-out failed; clearing local session anyway");
            }
        }
        let cleared = self.holder.clear().await;
        self.tokens.mark_signed_out();
        if let Err(e) = self.storage.save_profile(None).await {
            warn!(error = %e, "failed to clear stored profile");
        }
        self.cache.lock().await.handle_user_logout();
        info!("signed out");
        cleared.map_err(AuthError::from)
    }

    async fn change_password(&self, current: &str, new: &str) -> AuthResult<()> {
        let email = self.current_email().await?;
        let session = self
            .api
            .sign_in_with_password(&email, current)
            .await
            .map_err(|e| match AuthError::from(e) {
                AuthError::AccountNotFound => AuthError::InvalidCredentials,
                other => other,
            })?;
        let token = session.access_token.clone();
        self.holder.set(session).await?;

        let update = UserUpdate {
            password: Some(new.to_string()),
            data: None,
        };
        self.api.update_user(&token, &update).await?;
        info!("password changed");
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        self.api.recover_password(email.trim()).await?;
        Ok(())
    }

    async fn resend_verification(&self, email: &str) -> AuthResult<()> {
        self.api.resend_verification(email.trim()).await?;
        Ok(())
    }

    async fn verify_email(&self, email: &str, code: &str) -> AuthResult<UserSession> {
        let session = self.api.verify_email(email.trim(), code.trim()).await?;
        self.establish(session).await
    }

    async fn update_profile(&self, profile: ProfileData) -> AuthResult<User> {
        let token = self.require_access_token().await?;
        let update = UserUpdate {
            password: None,
            data: Some(profile),
        };
        let user = self.api.update_user(&token, &update).await?;

        {
            let mut guard = self.holder.lock().await;
            if let Some(session) = guard.session().cloned() {
                guard
                    .replace(Session {
                        user: Some(user.clone()),
                        ..session
                    })
                    .await?;
            }
        }
        self.cache
            .lock()
            .await
            .handle_data_update(PROFILE_CACHE_TYPE, &user.id);
        self.remember_profile(&user).await;
        Ok(user)
    }

    async fn current_session(&self) -> AuthResult<Option<UserSession>> {
        if self.tokens.get_valid_access_token().await.is_none() {
            return Ok(None);
        }
        Ok(self.holder.session().await.map(|s| s.to_user_session()))
    }
}
