//! Client configuration
//!
//! Values come from command-line flags or `INVOICEDESK_*` environment
//! variables (see `cli.rs`); everything has a usable default except the
//! backend URL and key, which default to a local development backend.

use std::path::PathBuf;
use std::time::Duration;

use crate::session::StrategyKind;

/// Default backend for local development
pub const DEFAULT_API_URL: &str = "http://localhost:54321";

/// Configuration for the background maintenance loop
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Interval between maintenance passes
    pub interval: Duration,
    /// Whether the loop runs at all
    pub enabled: bool,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300), // 5 minutes
            enabled: true,
        }
    }
}

/// Settings needed to build an [`AppContainer`](crate::container::AppContainer)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the hosted backend
    pub api_url: String,
    /// Public API key sent with every auth request
    pub api_key: String,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// How early tokens are refreshed
    pub refresh_strategy: StrategyKind,
    /// Directory for secure storage; the platform data directory when `None`
    pub storage_dir: Option<PathBuf>,
    pub maintenance: MaintenanceConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            request_timeout: Duration::from_secs(30),
            refresh_strategy: StrategyKind::default(),
            storage_dir: None,
            maintenance: MaintenanceConfig::default(),
        }
    }
}
