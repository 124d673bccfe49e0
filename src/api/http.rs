//! HTTP client for the hosted auth backend

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::dto::{
    EmailRequest, ErrorBody, PasswordCredentials, RefreshRequest, ResendRequest, SignUpRequest,
    TokenResponse, UserDto, UserUpdate, VerifyRequest,
};
use super::{ApiError, RemoteAuthApi};
use crate::session::{now_epoch_seconds, Session, User};

/// Client for the `/auth/v1` endpoints
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpAuthApi {
    /// Create a new client for the project at `base_url`
    ///
    /// # Arguments
    /// * `base_url` - Project URL, e.g. `https://project.example.co`
    /// * `api_key` - Public (anon) key sent as the `apikey` header
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, api_key))
    }

    /// Create a new client with a custom HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path)).header("apikey", &self.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let raw = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&raw).unwrap_or_default();
        let message = body.message(&raw);
        debug!(status = status.as_u16(), %message, "auth API returned an error");
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let text = self.send(request).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn token_grant(&self, request: RequestBuilder) -> Result<Session, ApiError> {
        let response: TokenResponse = self.send_json(request).await?;
        response.into_session(now_epoch_seconds())
    }
}

#[async_trait]
impl RemoteAuthApi for HttpAuthApi {
    async fn sign_up(&self, email: &str, password: &str, full_name: Option<&str>) -> Result<Session, ApiError> {
        let data = match full_name {
            Some(name) => json!({ "full_name": name }),
            None => json!({}),
        };
        let request = self.post("signup").json(&SignUpRequest { email, password, data });
        self.token_grant(request).await
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let request = self
            .post("token?grant_type=password")
            .json(&PasswordCredentials { email, password });
        self.token_grant(request).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, ApiError> {
        let request = self
            .post("token?grant_type=refresh_token")
            .json(&RefreshRequest { refresh_token });
        self.token_grant(request).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ApiError> {
        self.send(self.post("logout").bearer_auth(access_token)).await?;
        Ok(())
    }

    async fn update_user(&self, access_token: &str, update: &UserUpdate) -> Result<User, ApiError> {
        let request = self
            .client
            .put(self.url("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .json(update);
        let user: UserDto = self.send_json(request).await?;
        user.into_user()
    }

    async fn recover_password(&self, email: &str) -> Result<(), ApiError> {
        self.send(self.post("recover").json(&EmailRequest { email })).await?;
        Ok(())
    }

    async fn resend_verification(&self, email: &str) -> Result<(), ApiError> {
        let request = self.post("resend").json(&ResendRequest { kind: "signup", email });
        self.send(request).await?;
        Ok(())
    }

    async fn verify_email(&self, email: &str, token: &str) -> Result<Session, ApiError> {
        let request = self.post("verify").json(&VerifyRequest {
            kind: "email",
            email,
            token,
        });
        self.token_grant(request).await
    }
}
