//! Command-line interface parsing for invoicedesk
//!
//! This module handles parsing of CLI arguments using clap. Connection
//! settings can also come from `INVOICEDESK_*` environment variables.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ClientConfig, MaintenanceConfig, DEFAULT_API_URL};
use crate::session::StrategyKind;

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// A duration flag was zero
    #[error("Invalid {0}: must be greater than zero")]
    ZeroDuration(&'static str),
}

/// invoicedesk - account and session tools for the invoicedesk backend
#[derive(Parser, Debug)]
#[command(name = "invoicedesk")]
#[command(about = "Account, session and cache tools for the invoicedesk client")]
#[command(version)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, env = "INVOICEDESK_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Public API key sent with auth requests
    #[arg(long, env = "INVOICEDESK_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// How early access tokens are refreshed
    #[arg(long, value_enum, env = "INVOICEDESK_REFRESH_STRATEGY", default_value_t = StrategyKind::Aggressive)]
    pub refresh_strategy: StrategyKind,

    /// Directory for stored session data (defaults to the platform data directory)
    #[arg(long, env = "INVOICEDESK_STORAGE_DIR", value_name = "DIR")]
    pub storage_dir: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30, value_name = "SECS")]
    pub timeout: u64,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "INVOICEDESK_LOG", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Account and session commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sign in with email and password
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long, env = "INVOICEDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create a new account
    SignUp {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long)]
        full_name: Option<String>,
    },
    /// Sign out and clear the stored session
    SignOut,
    /// Show the current session state
    Status,
    /// Refresh the access token now
    Refresh,
    /// Send a password reset email
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    /// Send the verification email again
    ResendVerification {
        #[arg(long)]
        email: String,
    },
    /// Confirm an email address with the emailed code
    Verify {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
    },
    /// Change the signed-in user's password
    ChangePassword {
        #[arg(long)]
        current_password: String,
        #[arg(long)]
        new_password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Update the signed-in user's profile
    UpdateProfile {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        company_name: Option<String>,
    },
}

impl Cli {
    /// Builds the client configuration from the parsed arguments
    ///
    /// # Returns
    /// * `Ok(ClientConfig)` with the requested settings
    /// * `Err(CliError)` if a value is out of range
    pub fn to_config(&self) -> Result<ClientConfig, CliError> {
        if self.timeout == 0 {
            return Err(CliError::ZeroDuration("timeout"));
        }
        Ok(ClientConfig {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            request_timeout: Duration::from_secs(self.timeout),
            refresh_strategy: self.refresh_strategy,
            storage_dir: self.storage_dir.clone(),
            // One-shot commands never run long enough for a maintenance pass
            maintenance: MaintenanceConfig {
                enabled: false,
                ..Default::default()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["invoicedesk", "status"]);
        assert_eq!(cli.command, Command::Status);
        assert_eq!(cli.refresh_strategy, StrategyKind::Aggressive);
        assert_eq!(cli.timeout, 30);
    }

    #[test]
    fn test_cli_parse_sign_in() {
        let cli = Cli::parse_from([
            "invoicedesk",
            "sign-in",
            "--email",
            "user@example.com",
            "--password",
            "secret",
        ]);
        assert_eq!(
            cli.command,
            Command::SignIn {
                email: "user@example.com".to_string(),
                password: "secret".to_string(),
            }
        );
    }

    #[test]
    fn test_cli_parse_strategy() {
        let cli = Cli::parse_from(["invoicedesk", "--refresh-strategy", "adaptive", "refresh"]);
        assert_eq!(cli.refresh_strategy, StrategyKind::Adaptive);
    }

    #[test]
    fn test_cli_rejects_unknown_strategy() {
        let result = Cli::try_parse_from(["invoicedesk", "--refresh-strategy", "lazy", "status"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_to_config_copies_settings() {
        let cli = Cli::parse_from([
            "invoicedesk",
            "--api-url",
            "https://project.example.co",
            "--timeout",
            "5",
            "--storage-dir",
            "/tmp/invoicedesk-test",
            "status",
        ]);
        let config = cli.to_config().expect("Config should build");
        assert_eq!(config.api_url, "https://project.example.co");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.storage_dir, Some(PathBuf::from("/tmp/invoicedesk-test")));
        assert!(!config.maintenance.enabled);
    }

    #[test]
    fn test_to_config_rejects_zero_timeout() {
        let cli = Cli::parse_from(["invoicedesk", "--timeout", "0", "status"]);
        let err = cli.to_config().unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }
}
