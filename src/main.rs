//! invoicedesk - account and session tools for the invoicedesk backend
//!
//! A thin command-line front end over the client core: it wires an
//! `AppContainer` from flags and environment, runs one command, and exits.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use invoicedesk::auth::{ChangePasswordParams, SignUpParams, UpdateProfileParams};
use invoicedesk::cli::{Cli, Command};
use invoicedesk::container::AppContainer;
use invoicedesk::session::UserSession;

/// Installs the log subscriber; `RUST_LOG` wins over `--log-level`
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn print_session(session: &UserSession) {
    println!("Signed in as {} ({})", session.user.email, session.user.id);
    println!("Access token expires at {}", session.tokens.expires_at);
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.to_config()?;
    let container = AppContainer::new(config)?;

    match cli.command {
        Command::SignIn { email, password } => {
            let session = container.sign_in().execute(&email, &password).await?;
            print_session(&session);
        }
        Command::SignUp {
            email,
            password,
            confirm_password,
            full_name,
        } => {
            let session = container
                .sign_up()
                .execute(SignUpParams {
                    email,
                    password,
                    confirm_password,
                    full_name,
                })
                .await?;
            print_session(&session);
        }
        Command::SignOut => {
            container.sign_out().execute().await?;
            println!("Signed out");
        }
        Command::Status => {
            let state = container.tokens().state().await;
            match container.session().session().await {
                Some(session) => {
                    println!("State: {:?}", state);
                    println!("User: {}", session.user_id);
                    println!("Expires at: {}", session.expires_at);
                }
                None => println!("Signed out"),
            }
        }
        Command::Refresh => {
            if container.tokens().refresh_tokens().await {
                println!("Token refreshed");
            } else {
                return Err("Token refresh failed".into());
            }
        }
        Command::ForgotPassword { email } => {
            container.forgot_password().execute(&email).await?;
            println!("Password reset email sent to {}", email.trim());
        }
        Command::ResendVerification { email } => {
            container.email_verification().resend(&email).await?;
            println!("Verification email sent to {}", email.trim());
        }
        Command::Verify { email, code } => {
            let session = container.email_verification().verify(&email, &code).await?;
            print_session(&session);
        }
        Command::ChangePassword {
            current_password,
            new_password,
            confirm_password,
        } => {
            container
                .change_password()
                .execute(ChangePasswordParams {
                    current_password,
                    new_password,
                    confirm_password,
                })
                .await?;
            println!("Password changed");
        }
        Command::UpdateProfile {
            full_name,
            company_name,
        } => {
            let user = container
                .update_profile()
                .execute(UpdateProfileParams {
                    full_name,
                    company_name,
                })
                .await?;
            println!("Profile updated for {}", user.id);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    run(cli).await
}
