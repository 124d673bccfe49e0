//! Auth use cases
//!
//! Each use case validates its input synchronously and only then calls the
//! repository, so invalid input never reaches the network. Checks run in a
//! fixed order: required fields, then formats, then cross-field rules.

use std::sync::Arc;

use super::repository::AuthRepository;
use super::validation::{
    check_email, check_matches, check_max_length, check_password_strength, check_sign_in_password,
    require,
};
use crate::api::ProfileData;
use crate::error::{AuthError, AuthResult};
use crate::session::{User, UserSession};

/// Signs an existing user in
pub struct SignIn {
    repository: Arc<dyn AuthRepository>,
}

impl SignIn {
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        Self { repository }
    }

    /// Only a 6-character minimum is enforced on the password here; the
    /// stronger rule applies when a password is chosen.
    pub fn validate(email: &str, password: &str) -> AuthResult<()> {
        require("email", email, "Email")?;
        require("password", password, "Password")?;
        check_email("email", email)?;
        check_sign_in_password("password", password)
    }

    pub async fn execute(&self, email: &str, password: &str) -> AuthResult<UserSession> {
        Self::validate(email, password)?;
        self.repository.sign_in(email.trim(), password).await
    }
}

/// Input for [`SignUp`]
#[derive(Debug, Clone, Default)]
pub struct SignUpParams {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: Option<String>,
}

/// Registers a new account
pub struct SignUp {
    repository: Arc<dyn AuthRepository>,
}

impl SignUp {
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        Self { repository }
    }

    pub fn validate(params: &SignUpParams) -> AuthResult<()> {
        require("email", &params.email, "Email")?;
        require("password", &params.password, "Password")?;
        require("confirm_password", &params.confirm_password, "Password confirmation")?;
        check_email("email", &params.email)?;
        check_password_strength("password", &params.password)?;
        if let Some(name) = &params.full_name {
            check_max_length("full_name", name, "Full name")?;
        }
        check_matches("confirm_password", &params.password, &params.confirm_password)
    }

    pub async fn execute(&self, params: SignUpParams) -> AuthResult<UserSession> {
        Self::validate(&params)?;
        let full_name = params
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        self.repository
            .sign_up(params.email.trim(), &params.password, full_name)
            .await
    }
}

/// Input for [`ChangePassword`]
#[derive(Debug, Clone, Default)]
pub struct ChangePasswordParams {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Changes the signed-in user's password
pub struct ChangePassword {
    repository: Arc<dyn AuthRepository>,
}

impl ChangePassword {
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        Self { repository }
    }

    pub fn validate(params: &ChangePasswordParams) -> AuthResult<()> {
        require("current_password", &params.current_password, "Current password")?;
        require("new_password", &params.new_password, "New password")?;
        require("confirm_password", &params.confirm_password, "Password confirmation")?;
        check_password_strength("new_password", &params.new_password)?;
        check_matches("confirm_password", &params.new_password, &params.confirm_password)?;
        if params.new_password == params.current_password {
            return Err(AuthError::validation(
                "new_password",
                "New password must be different from the current password",
            ));
        }
        Ok(())
    }

    pub async fn execute(&self, params: ChangePasswordParams) -> AuthResult<()> {
        Self::validate(&params)?;
        self.repository
            .change_password(&params.current_password, &params.new_password)
            .await
    }
}

/// Sends a password reset email
pub struct ForgotPassword {
    repository: Arc<dyn AuthRepository>,
}

impl ForgotPassword {
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        Self { repository }
    }

    pub fn validate(email: &str) -> AuthResult<()> {
        require("email", email, "Email")?;
        check_email("email", email)
    }

    pub async fn execute(&self, email: &str) -> AuthResult<()> {
        Self::validate(email)?;
        self.repository.send_password_reset(email.trim()).await
    }
}

/// Resends and confirms email verification codes
pub struct EmailVerification {
    repository: Arc<dyn AuthRepository>,
}

impl EmailVerification {
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        Self { repository }
    }

    pub async fn resend(&self, email: &str) -> AuthResult<()> {
        require("email", email, "Email")?;
        check_email("email", email)?;
        self.repository.resend_verification(email.trim()).await
    }

    /// Confirms the address with the code from the email and signs the user in
    pub async fn verify(&self, email: &str, code: &str) -> AuthResult<UserSession> {
        require("email", email, "Email")?;
        require("code", code, "Verification code")?;
        check_email("email", email)?;
        if !code.trim().chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AuthError::validation("code", "Verification code is invalid"));
        }
        self.repository.verify_email(email.trim(), code.trim()).await
    }
}

/// Input for [`UpdateProfile`]
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileParams {
    pub full_name: String,
    pub company_name: Option<String>,
}

/// Updates the signed-in user's profile
pub struct UpdateProfile {
    repository: Arc<dyn AuthRepository>,
}

impl UpdateProfile {
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        Self { repository }
    }

    pub fn validate(params: &UpdateProfileParams) -> AuthResult<()> {
        require("full_name", &params.full_name, "Full name")?;
        check_max_length("full_name", &params.full_name, "Full name")?;
        if let Some(company) = &params.company_name {
            check_max_length("company_name", company, "Company name")?;
        }
        Ok(())
    }

    pub async fn execute(&self, params: UpdateProfileParams) -> AuthResult<User> {
        Self::validate(&params)?;
        let profile = ProfileData {
            full_name: params.full_name.trim().to_string(),
            company_name: params
                .company_name
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        };
        self.repository.update_profile(profile).await
    }
}

/// Signs the current user out
pub struct SignOut {
    repository: Arc<dyn AuthRepository>,
}

impl SignOut {
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self) -> AuthResult<()> {
        self.repository.sign_out().await
    }
}

/// Returns the signed-in user, if any
pub struct CurrentSession {
    repository: Arc<dyn AuthRepository>,
}

impl CurrentSession {
    pub fn new(repository: Arc<dyn AuthRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self) -> AuthResult<Option<UserSession>> {
        self.repository.current_session().await
    }
}
