//! FunPay marketplace integration.
//!
//! - [`client`]: HTTP client for orders, chats, refunds and listings
//! - [`types`]: orders, listings, chat messages, poll events
//! - [`mock`]: in-memory marketplace for tests

use crate::error::FunpayError;

pub mod client;
pub mod mock;
pub mod types;

pub use client::FunpayClient;
pub use mock::MockFunpayClient;
pub use types::{ChatMessage, Event, Listing, Order};

/// Marketplace operations the order flow depends on.
#[allow(async_fn_in_trait)]
pub trait Marketplace {
    /// Send a chat message to a buyer.
    async fn send_message(&self, chat_id: u64, text: &str) -> Result<(), FunpayError>;

    /// Refund a marketplace order to the buyer.
    async fn refund(&self, order_id: &str) -> Result<(), FunpayError>;

    /// Mark a marketplace order as completed.
    async fn complete_order(&self, order_id: &str) -> Result<(), FunpayError>;

    /// Deactivate every active listing in a subcategory. Returns how many
    /// listings were flipped.
    async fn deactivate_category(&self, category_id: u64) -> Result<u64, FunpayError>;
}
