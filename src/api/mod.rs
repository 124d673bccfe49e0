//! Remote auth API
//!
//! This module defines the `RemoteAuthApi` collaborator used by the session
//! and auth layers, and an HTTP implementation speaking the backend's
//! GoTrue-style REST dialect.

mod dto;
mod http;

pub use dto::{ProfileData, TokenResponse, UserDto, UserUpdate};
pub use http::HttpAuthApi;

use async_trait::async_trait;
use thiserror::Error;

use crate::session::{Session, User};

/// Errors that can occur when calling the auth API
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),

    /// Access token is not shaped like a JWT
    #[error("Malformed access token in response")]
    MalformedToken,
}

/// Operations of the hosted auth backend
#[async_trait]
pub trait RemoteAuthApi: Send + Sync {
    /// Registers a new account and returns its first session
    async fn sign_up(&self, email: &str, password: &str, full_name: Option<&str>) -> Result<Session, ApiError>;

    /// Password grant
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, ApiError>;

    /// Refresh-token grant
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, ApiError>;

    /// Revokes the session on the backend
    async fn sign_out(&self, access_token: &str) -> Result<(), ApiError>;

    /// Updates password and/or profile metadata of the signed-in user
    async fn update_user(&self, access_token: &str, update: &UserUpdate) -> Result<User, ApiError>;

    /// Sends a password recovery email
    async fn recover_password(&self, email: &str) -> Result<(), ApiError>;

    /// Sends the sign-up confirmation email again
    async fn resend_verification(&self, email: &str) -> Result<(), ApiError>;

    /// Confirms an email address with the one-time code from the email
    async fn verify_email(&self, email: &str, token: &str) -> Result<Session, ApiError>;
}
