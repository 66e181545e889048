//! Mock top-up service client for unit testing.
//!
//! Mirrors the [`TopupClient`](super::client::TopupClient) surface without
//! making network requests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::TopupError;

use super::types::Currency;

/// Configuration for mock client behavior.
#[derive(Debug, Clone, Default)]
pub struct MockTopupConfig {
    /// Balance to return from check_balance.
    pub balance: Decimal,
    /// Whether to fail balance requests.
    pub fail_balance: bool,
    /// HTTP status to fail create_order with (None = succeed).
    pub fail_create_status: Option<u16>,
    /// HTTP status to fail pay_order with (None = succeed).
    pub fail_pay_status: Option<u16>,
    /// USD conversion rate applied to non-USD currencies.
    pub usd_rate: Option<Decimal>,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

/// Mock top-up client for testing.
#[derive(Debug, Clone)]
pub struct MockTopupClient {
    /// Mock configuration.
    config: Arc<Mutex<MockTopupConfig>>,
    /// Logins considered valid.
    valid_logins: Arc<Mutex<HashSet<String>>>,
    /// Orders created (custom_id, login, usd amount).
    created_orders: Arc<Mutex<Vec<(String, String, Decimal)>>>,
    /// Orders paid (custom_id).
    paid_orders: Arc<Mutex<Vec<String>>>,
}

impl MockTopupClient {
    /// Create a new mock client with default configuration.
    pub fn new() -> Self {
        Self::with_config(MockTopupConfig::default())
    }

    /// Create a mock client with custom configuration.
    pub fn with_config(config: MockTopupConfig) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
            valid_logins: Arc::new(Mutex::new(HashSet::new())),
            created_orders: Arc::new(Mutex::new(Vec::new())),
            paid_orders: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the mock balance.
    pub fn set_balance(&self, balance: Decimal) {
        self.config.lock().unwrap().balance = balance;
    }

    /// Register a login as valid.
    pub fn add_valid_login(&self, login: impl Into<String>) {
        self.valid_logins.lock().unwrap().insert(login.into());
    }

    /// Orders created so far.
    pub fn created_orders(&self) -> Vec<(String, String, Decimal)> {
        self.created_orders.lock().unwrap().clone()
    }

    /// Orders paid so far.
    pub fn paid_orders(&self) -> Vec<String> {
        self.paid_orders.lock().unwrap().clone()
    }

    async fn simulate_latency(&self) {
        let latency_ms = self.config.lock().unwrap().latency_ms;
        if latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(latency_ms)).await;
        }
    }

    /// Check whether a Steam login can be topped up.
    pub async fn check_login(&self, login: &str) -> Result<bool, TopupError> {
        self.simulate_latency().await;
        if login.is_empty() {
            return Ok(false);
        }
        Ok(self.valid_logins.lock().unwrap().contains(login))
    }

    /// Convert an amount to USD using the configured rate.
    pub async fn convert_to_usd(
        &self,
        currency: Currency,
        amount: Decimal,
    ) -> Result<Decimal, TopupError> {
        self.simulate_latency().await;
        if currency == Currency::USD {
            return Ok(amount);
        }

        let rate = self.config.lock().unwrap().usd_rate;
        match rate {
            Some(rate) => Ok((amount * rate).round_dp(2)),
            None => Err(TopupError::ConversionFailed {
                currency,
                amount,
                reason: "mock rate not configured".to_string(),
            }),
        }
    }

    /// Create a mock top-up order.
    pub async fn create_order(
        &self,
        login: &str,
        usd_amount: Decimal,
    ) -> Result<String, TopupError> {
        self.simulate_latency().await;

        if let Some(status) = self.config.lock().unwrap().fail_create_status {
            return Err(TopupError::ServiceStatus {
                status,
                body: "mock create failure".to_string(),
            });
        }

        let custom_id = Uuid::new_v4().to_string();
        self.created_orders.lock().unwrap().push((
            custom_id.clone(),
            login.to_string(),
            usd_amount.round_dp(2),
        ));
        Ok(custom_id)
    }

    /// Pay a mock top-up order.
    pub async fn pay_order(&self, custom_id: &str) -> Result<(), TopupError> {
        self.simulate_latency().await;

        if let Some(status) = self.config.lock().unwrap().fail_pay_status {
            return Err(TopupError::ServiceStatus {
                status,
                body: "mock pay failure".to_string(),
            });
        }

        self.paid_orders.lock().unwrap().push(custom_id.to_string());
        Ok(())
    }

    /// Get the mock balance.
    pub async fn check_balance(&self) -> Result<Decimal, TopupError> {
        self.simulate_latency().await;

        let config = self.config.lock().unwrap();
        if config.fail_balance {
            return Err(TopupError::BalanceFailed("mock balance failure".to_string()));
        }
        Ok(config.balance)
    }
}

impl Default for MockTopupClient {
    fn default() -> Self {
        Self::new()
    }
}

impl super::TopupService for MockTopupClient {
    async fn check_login(&self, login: &str) -> Result<bool, TopupError> {
        MockTopupClient::check_login(self, login).await
    }

    async fn convert_to_usd(
        &self,
        currency: Currency,
        amount: Decimal,
    ) -> Result<Decimal, TopupError> {
        MockTopupClient::convert_to_usd(self, currency, amount).await
    }

    async fn create_order(&self, login: &str, usd_amount: Decimal) -> Result<String, TopupError> {
        MockTopupClient::create_order(self, login, usd_amount).await
    }

    async fn pay_order(&self, custom_id: &str) -> Result<(), TopupError> {
        MockTopupClient::pay_order(self, custom_id).await
    }

    async fn check_balance(&self) -> Result<Decimal, TopupError> {
        MockTopupClient::check_balance(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn mock_login_check() {
        let client = MockTopupClient::new();
        client.add_valid_login("gabelogannewell");

        assert!(client.check_login("gabelogannewell").await.unwrap());
        assert!(!client.check_login("nosuchlogin").await.unwrap());
        assert!(!client.check_login("").await.unwrap());
    }

    #[tokio::test]
    async fn mock_usd_passthrough() {
        let client = MockTopupClient::new();
        let usd = client
            .convert_to_usd(Currency::USD, dec!(3.50))
            .await
            .unwrap();
        assert_eq!(usd, dec!(3.50));
    }

    #[tokio::test]
    async fn mock_conversion_uses_rate() {
        let client = MockTopupClient::with_config(MockTopupConfig {
            usd_rate: Some(dec!(0.01)),
            ..Default::default()
        });

        let usd = client
            .convert_to_usd(Currency::RUB, dec!(100))
            .await
            .unwrap();
        assert_eq!(usd, dec!(1.00));
    }

    #[tokio::test]
    async fn mock_order_lifecycle() {
        let client = MockTopupClient::new();

        let custom_id = client.create_order("buyer", dec!(1.234)).await.unwrap();
        client.pay_order(&custom_id).await.unwrap();

        let created = client.created_orders();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].2, dec!(1.23)); // rounded to cents
        assert_eq!(client.paid_orders(), vec![custom_id]);
    }

    #[tokio::test]
    async fn mock_failure_modes() {
        let client = MockTopupClient::with_config(MockTopupConfig {
            fail_create_status: Some(500),
            ..Default::default()
        });

        let result = client.create_order("buyer", dec!(1)).await;
        assert!(matches!(
            result,
            Err(TopupError::ServiceStatus { status: 500, .. })
        ));
    }
}
