//! Application container
//!
//! Built once at startup and passed by reference to everything that needs a
//! collaborator. There is no global registry: two containers are fully
//! independent, which is what the tests rely on.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::api::{ApiError, HttpAuthApi, RemoteAuthApi};
use crate::auth::{
    AuthRepository, ChangePassword, CurrentSession, EmailVerification, ForgotPassword,
    SessionAuthRepository, SignIn, SignOut, SignUp, UpdateProfile,
};
use crate::cache::{CacheManager, SharedCache};
use crate::config::ClientConfig;
use crate::maintenance::MaintenanceHandle;
use crate::session::{SessionHolder, TokenManager};
use crate::storage::{FileStorage, SecureStorage};

/// Errors that can occur while wiring the container
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The HTTP client could not be built
    #[error("Failed to build API client: {0}")]
    Api(#[from] ApiError),

    /// No storage directory was configured and none could be determined
    #[error("Cannot determine a storage directory; pass --storage-dir")]
    NoStorageDir,
}

/// Owns every long-lived collaborator of the client
pub struct AppContainer {
    config: ClientConfig,
    storage: Arc<dyn SecureStorage>,
    session: Arc<SessionHolder>,
    tokens: Arc<TokenManager>,
    cache: SharedCache,
    repository: Arc<dyn AuthRepository>,
}

impl AppContainer {
    /// Wires the container against the HTTP backend and file storage
    pub fn new(config: ClientConfig) -> Result<Self, ContainerError> {
        let api = HttpAuthApi::new(&config.api_url, &config.api_key, config.request_timeout)?;
        let storage = match &config.storage_dir {
            Some(dir) => FileStorage::with_dir(dir.clone()),
            None => FileStorage::new().ok_or(ContainerError::NoStorageDir)?,
        };
        Ok(Self::with_parts(config, Arc::new(api), Arc::new(storage)))
    }

    /// Wires the container around the given API and storage
    pub fn with_parts(
        config: ClientConfig,
        api: Arc<dyn RemoteAuthApi>,
        storage: Arc<dyn SecureStorage>,
    ) -> Self {
        let session = Arc::new(SessionHolder::new(storage.clone()));
        let tokens = Arc::new(TokenManager::new(
            api.clone(),
            session.clone(),
            config.refresh_strategy.build(),
        ));
        let mut cache_manager = CacheManager::new();
        cache_manager.initialize();
        let cache: SharedCache = Arc::new(Mutex::new(cache_manager));
        let repository: Arc<dyn AuthRepository> = Arc::new(SessionAuthRepository::new(
            api,
            storage.clone(),
            session.clone(),
            tokens.clone(),
            cache.clone(),
        ));
        info!(api_url = %config.api_url, strategy = ?config.refresh_strategy, "container ready");

        Self {
            config,
            storage,
            session,
            tokens,
            cache,
            repository,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn SecureStorage> {
        &self.storage
    }

    /// Session holder backing the access-token, owner-id and session providers
    pub fn session(&self) -> &Arc<SessionHolder> {
        &self.session
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn sign_in(&self) -> SignIn {
        SignIn::new(self.repository.clone())
    }

    pub fn sign_up(&self) -> SignUp {
        SignUp::new(self.repository.clone())
    }

    pub fn sign_out(&self) -> SignOut {
        SignOut::new(self.repository.clone())
    }

    pub fn change_password(&self) -> ChangePassword {
        ChangePassword::new(self.repository.clone())
    }

    pub fn forgot_password(&self) -> ForgotPassword {
        ForgotPassword::new(self.repository.clone())
    }

    pub fn email_verification(&self) -> EmailVerification {
        EmailVerification::new(self.repository.clone())
    }

    pub fn update_profile(&self) -> UpdateProfile {
        UpdateProfile::new(self.repository.clone())
    }

    pub fn current_session(&self) -> CurrentSession {
        CurrentSession::new(self.repository.clone())
    }

    /// Starts the background maintenance loop with the configured interval
    pub fn spawn_maintenance(&self) -> MaintenanceHandle {
        MaintenanceHandle::spawn(
            self.config.maintenance.clone(),
            self.cache.clone(),
            self.tokens.clone(),
        )
    }
}
