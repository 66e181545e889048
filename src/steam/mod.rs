//! Steam wallet top-up service integration.
//!
//! - [`client`]: HTTP client for the top-up API
//! - [`types`]: wire types and wallet currencies
//! - [`mock`]: in-memory client for tests

use rust_decimal::Decimal;

use crate::error::TopupError;

pub mod client;
pub mod mock;
pub mod types;

pub use client::TopupClient;
pub use mock::{MockTopupClient, MockTopupConfig};
pub use types::Currency;

/// Operations the top-up service exposes to the order flow.
#[allow(async_fn_in_trait)]
pub trait TopupService {
    /// Check whether a Steam login can be topped up.
    async fn check_login(&self, login: &str) -> Result<bool, TopupError>;

    /// Convert an amount in a wallet currency to USD.
    async fn convert_to_usd(
        &self,
        currency: Currency,
        amount: Decimal,
    ) -> Result<Decimal, TopupError>;

    /// Create a top-up order for a login. Returns the correlation id.
    async fn create_order(&self, login: &str, usd_amount: Decimal)
        -> Result<String, TopupError>;

    /// Pay (execute) a previously created top-up order.
    async fn pay_order(&self, custom_id: &str) -> Result<(), TopupError>;

    /// Current service balance in USD.
    async fn check_balance(&self) -> Result<Decimal, TopupError>;
}
