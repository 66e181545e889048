//! FunPay bot that sells Steam wallet top-ups.
//!
//! The bot polls marketplace events, walks each buyer through a short chat
//! dialog (login → confirmation → top-up), performs the top-up through a
//! third-party service and reconciles failures:
//!
//! ```text
//! new order ──> validate currency/amount ──> ask for Steam login
//! login ──> /check ──> buyer confirms with `+`
//! `+` ──> create_order ──> pay_order ──> buyer confirms credit
//! failure ──> balance < MIN_BALANCE? deactivate listings ──> refund
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`funpay`]: Marketplace client (orders, chats, listings, refunds)
//! - [`steam`]: Top-up service client (login checks, rates, orders, balance)
//! - [`orders`]: Order validation, buyer sessions and execution
//! - [`api`]: HTTP API for health/status
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod funpay;
pub mod metrics;
pub mod orders;
pub mod steam;
pub mod utils;

pub use config::Config;
pub use error::{BotError, Result};
