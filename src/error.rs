//! Domain error taxonomy for authentication and session handling
//!
//! Infrastructure failures (HTTP, storage) are converted into [`AuthError`] at the
//! repository boundary. Classification is a best-effort substring match on the
//! underlying failure message; anything unrecognised becomes
//! [`AuthError::Unknown`] with the original message preserved.

use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Result type returned by repositories and use cases
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors surfaced to callers of the auth layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The backend could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a server-side failure
    #[error("Server error: {0}")]
    Server(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Email address has not been verified")]
    EmailNotVerified,

    #[error("An account with this email already exists")]
    EmailAlreadyExists,

    #[error("Password is too weak")]
    WeakPassword,

    #[error("Email address is invalid")]
    InvalidEmail,

    #[error("Access token expired")]
    TokenExpired,

    #[error("Refresh token is invalid")]
    RefreshTokenInvalid,

    /// No usable session is available
    #[error("Session is invalid")]
    SessionInvalid,

    #[error("Too many attempts, try again later")]
    TooManyAttempts,

    #[error("Security error: {0}")]
    Security(String),

    #[error("Certificate pinning failed")]
    CertificatePinning,

    /// Secure storage could not be written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Input rejected before any network call
    #[error("{message}")]
    Validation {
        /// Name of the offending input field
        field: String,
        /// User-facing message
        message: String,
    },

    /// Fallback for failures that could not be classified
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AuthError {
    /// Creates a validation error for the given field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AuthError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the field name if this is a validation error
    pub fn field(&self) -> Option<&str> {
        match self {
            AuthError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Classifies a raw failure message into the taxonomy
    ///
    /// Matching is case-insensitive and ordered from most to least specific.
    /// The heuristic is not exact; an unmatched message becomes `Unknown`.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        if has(&["certificate pinning", "pinning"]) {
            AuthError::CertificatePinning
        } else if has(&["certificate", "ssl", "tls handshake", "security"]) {
            AuthError::Security(message.to_string())
        } else if has(&["invalid login credentials", "invalid credentials", "invalid password"]) {
            AuthError::InvalidCredentials
        } else if has(&["email not confirmed", "not verified", "email_not_confirmed"]) {
            AuthError::EmailNotVerified
        } else if has(&["already registered", "already exists", "user_already_exists"]) {
            AuthError::EmailAlreadyExists
        } else if has(&["user not found", "account not found", "no user"]) {
            AuthError::AccountNotFound
        } else if has(&["disabled", "banned", "suspended"]) {
            AuthError::AccountDisabled
        } else if has(&["weak password", "weak_password", "password should"]) {
            AuthError::WeakPassword
        } else if has(&["invalid email", "email address is invalid", "unable to validate email"]) {
            AuthError::InvalidEmail
        } else if has(&["refresh token", "refresh_token"]) {
            AuthError::RefreshTokenInvalid
        } else if has(&["jwt expired", "token expired", "token has expired"]) {
            AuthError::TokenExpired
        } else if has(&["session"]) {
            AuthError::SessionInvalid
        } else if has(&["rate limit", "too many", "429"]) {
            AuthError::TooManyAttempts
        } else if has(&["storage", "keychain", "keystore"]) {
            AuthError::Storage(message.to_string())
        } else if has(&["network", "connection", "timed out", "timeout", "dns", "unreachable"]) {
            AuthError::Network(message.to_string())
        } else if has(&["internal server", "server error", "bad gateway", "service unavailable", "500", "502", "503"]) {
            AuthError::Server(message.to_string())
        } else {
            AuthError::Unknown(message.to_string())
        }
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::RequestFailed(ref e) if e.is_connect() || e.is_timeout() => {
                AuthError::Network(e.to_string())
            }
            ApiError::Status { status, ref message } if status >= 500 => {
                match AuthError::classify(message) {
                    AuthError::Unknown(_) => AuthError::Server(format!("HTTP {}: {}", status, message)),
                    classified => classified,
                }
            }
            ApiError::Status { status: 429, .. } => AuthError::TooManyAttempts,
            ApiError::MalformedToken => AuthError::Security("malformed access token".to_string()),
            other => AuthError::classify(&other.to_string()),
        }
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        AuthError::Storage(err.to_string())
    }
}
