//! invoicedesk client core
//!
//! Session/token coordination and the in-memory TTL cache used by the
//! invoicedesk business client, plus the auth use cases in front of them.

pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod container;
pub mod error;
pub mod maintenance;
pub mod session;
pub mod storage;
