//! Session state and token lifecycle
//!
//! The session holder owns the single in-memory session, the token manager
//! keeps its access token fresh, and refresh strategies decide how early a
//! refresh happens.

mod holder;
mod model;
mod strategy;
mod token_manager;

pub use holder::{SessionGuard, SessionHolder};
pub use model::{now_epoch_seconds, AuthTokens, Session, User, UserSession};
pub use strategy::{Adaptive, Aggressive, Conservative, RefreshStrategy, StrategyKind};
pub use token_manager::{is_valid_token_format, RefreshOutcome, TokenManager, TokenState};
