//! Auth orchestration: validated use cases over an auth repository

mod repository;
mod use_cases;
pub mod validation;

pub use repository::{AuthRepository, SessionAuthRepository};
pub use use_cases::{
    ChangePassword, ChangePasswordParams, CurrentSession, EmailVerification, ForgotPassword, SignIn,
    SignOut, SignUp, SignUpParams, UpdateProfile, UpdateProfileParams,
};
