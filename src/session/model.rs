//! Session and token data types

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Current time as epoch seconds
pub fn now_epoch_seconds() -> i64 {
    Utc::now().timestamp()
}

/// Profile of the authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    /// Display name, if the user set one
    #[serde(default)]
    pub full_name: Option<String>,
    /// Company the user invoices as
    #[serde(default)]
    pub company_name: Option<String>,
    /// Whether the backend has confirmed the email address
    #[serde(default)]
    pub email_verified: bool,
}

/// The authenticated session as returned by the backend
///
/// A session is replaced as a whole on refresh; its fields are never mutated
/// in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry of the access token, seconds since the Unix epoch
    pub expires_at: i64,
    pub user_id: String,
    /// Profile returned alongside the tokens, if any
    #[serde(default)]
    pub user: Option<User>,
}

impl Session {
    /// True iff `now >= expires_at`
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_epoch_seconds())
    }

    /// True iff `now >= expires_at - buffer_seconds`
    pub fn needs_refresh_at(&self, now: i64, buffer_seconds: i64) -> bool {
        now >= self.expires_at.saturating_sub(buffer_seconds)
    }

    /// Projects the token part of the session
    pub fn tokens(&self) -> AuthTokens {
        AuthTokens {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: self.expires_at,
        }
    }

    /// Projects the session into a domain `UserSession`
    ///
    /// Falls back to a profile carrying only the user id when the backend did
    /// not return one.
    pub fn to_user_session(&self) -> UserSession {
        let user = self.user.clone().unwrap_or_else(|| User {
            id: self.user_id.clone(),
            email: String::new(),
            full_name: None,
            company_name: None,
            email_verified: false,
        });
        UserSession {
            user,
            tokens: self.tokens(),
        }
    }
}

/// Access and refresh tokens with their expiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

impl AuthTokens {
    /// True iff `now >= expires_at - buffer_seconds`
    pub fn is_expired_at(&self, now: i64, buffer_seconds: i64) -> bool {
        now >= self.expires_at.saturating_sub(buffer_seconds)
    }

    pub fn is_expired(&self, buffer_seconds: i64) -> bool {
        self.is_expired_at(now_epoch_seconds(), buffer_seconds)
    }
}

/// Authenticated user together with their tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user: User,
    pub tokens: AuthTokens,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: i64) -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at,
            user_id: "user-1".to_string(),
            user: None,
        }
    }

    #[test]
    fn test_is_expired_boundary() {
        let s = session(1_000);
        assert!(!s.is_expired_at(999));
        assert!(s.is_expired_at(1_000));
        assert!(s.is_expired_at(1_001));
    }

    #[test]
    fn test_needs_refresh_uses_buffer() {
        let s = session(1_000);
        assert!(!s.needs_refresh_at(699, 300));
        assert!(s.needs_refresh_at(700, 300));
        assert!(!s.needs_refresh_at(999, 0));
    }

    #[test]
    fn test_auth_tokens_expiry_with_buffer() {
        let tokens = session(1_000).tokens();
        assert!(!tokens.is_expired_at(899, 100));
        assert!(tokens.is_expired_at(900, 100));
    }

    #[test]
    fn test_user_session_falls_back_to_user_id() {
        let us = session(1_000).to_user_session();
        assert_eq!(us.user.id, "user-1");
        assert_eq!(us.tokens.access_token, "access");
    }

    #[test]
    fn test_session_deserializes_without_user() {
        let json = r#"{"access_token":"a","refresh_token":"r","expires_at":5,"user_id":"u"}"#;
        let s: Session = serde_json::from_str(json).expect("Session should parse");
        assert!(s.user.is_none());
        assert_eq!(s.expires_at, 5);
    }
}
