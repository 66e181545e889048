//! Steam wallet top-up service client.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::TopupError;
use crate::metrics;

use super::types::{
    BalanceResponse, CheckLoginRequest, CheckLoginResponse, CreateOrderRequest, Currency,
    OrderResponse, RatesRequest, RatesResponse, TokenRequest, TokenResponse,
};

/// Service product id for Steam wallet top-ups.
const TOPUP_SERVICE_ID: u32 = 1;

/// Top-up service API client.
///
/// Holds the bearer token behind a lock so a 401 mid-flight can refresh it
/// without tearing the client down.
#[derive(Debug, Clone)]
pub struct TopupClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Base URL of the top-up service.
    base_url: String,
    /// Service username.
    username: String,
    /// Service password.
    password: String,
    /// Current bearer token, if authenticated.
    token: Arc<RwLock<Option<String>>>,
}

impl TopupClient {
    /// Create a new top-up client from config.
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(std::time::Duration::from_millis(500))
            .tcp_nodelay(true)
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(config.http_pool_size)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()
            .expect("failed to create HTTP client");

        Self {
            http,
            base_url: config.steam_api_url.clone(),
            username: config.steam_api_user.clone(),
            password: config.steam_api_pass.clone(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Get the HTTP client reference.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Authenticate against the service and store the bearer token.
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> Result<(), TopupError> {
        let url = format!("{}/token", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(&TokenRequest {
                username: self.username.clone(),
                password: self.password.clone(),
            })
            .send()
            .await
            .map_err(|e| TopupError::AuthFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TopupError::AuthFailed(format!("HTTP {}: {}", status, body)));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| TopupError::AuthFailed(e.to_string()))?;

        let token = token_response.access_token.ok_or(TopupError::MissingToken)?;
        *self.token.write().await = Some(token);

        info!("Authenticated with top-up service");
        Ok(())
    }

    /// Current bearer token, authenticating first if none is held.
    async fn token(&self) -> Result<String, TopupError> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }
        self.authenticate().await?;
        self.token
            .read()
            .await
            .clone()
            .ok_or(TopupError::MissingToken)
    }

    /// POST a JSON body with bearer auth, refreshing the token once when
    /// the service rejects it.
    async fn post_authed<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, TopupError> {
        let url = format!("{}/{}", self.base_url, path);
        let token = self.token().await?;

        let response = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(body)
            .send()
            .await?;

        if !token_rejected(response.status().as_u16()) {
            return Ok(response);
        }

        warn!(path, "Bearer token rejected, re-authenticating");
        self.authenticate().await?;
        let token = self.token().await?;

        Ok(self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(body)
            .send()
            .await?)
    }

    /// Check whether a Steam login can be topped up.
    #[instrument(skip(self), fields(login = %login))]
    pub async fn check_login(&self, login: &str) -> Result<bool, TopupError> {
        if login.is_empty() {
            return Ok(false);
        }

        let timer = metrics::timer_login_check();

        let response = self
            .post_authed(
                "check",
                &CheckLoginRequest {
                    login: login.to_string(),
                },
            )
            .await
            .map_err(|e| TopupError::LoginCheckFailed {
                login: login.to_string(),
                reason: e.to_string(),
            })?;

        let result: CheckLoginResponse =
            response
                .json()
                .await
                .map_err(|e| TopupError::LoginCheckFailed {
                    login: login.to_string(),
                    reason: e.to_string(),
                })?;

        drop(timer);
        debug!(eligible = result.result, "Login check completed");
        Ok(result.result)
    }

    /// Convert an amount in a wallet currency to USD. USD passes through
    /// without a service call.
    #[instrument(skip(self))]
    pub async fn convert_to_usd(
        &self,
        currency: Currency,
        amount: Decimal,
    ) -> Result<Decimal, TopupError> {
        if currency == Currency::USD {
            return Ok(amount);
        }

        let response = self
            .post_authed(
                "rates",
                &RatesRequest {
                    primary_currency: currency,
                    amount,
                },
            )
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TopupError::ConversionFailed {
                currency,
                amount,
                reason: format!("HTTP {}: {}", status, truncate(&body, 200)),
            });
        }

        let rates: RatesResponse =
            response
                .json()
                .await
                .map_err(|e| TopupError::ConversionFailed {
                    currency,
                    amount,
                    reason: e.to_string(),
                })?;

        rates.usd_price.ok_or(TopupError::ConversionFailed {
            currency,
            amount,
            reason: "response missing usd_price".to_string(),
        })
    }

    /// Create a top-up order for a login. Returns the generated correlation id.
    #[instrument(skip(self), fields(login = %login, usd = %usd_amount))]
    pub async fn create_order(
        &self,
        login: &str,
        usd_amount: Decimal,
    ) -> Result<String, TopupError> {
        let custom_id = Uuid::new_v4().to_string();

        let request = CreateOrderRequest {
            service_id: TOPUP_SERVICE_ID,
            quantity: usd_amount.round_dp(2),
            custom_id: custom_id.clone(),
            data: login.to_string(),
        };

        let response = self.post_authed("create_order", &request).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TopupError::ServiceStatus {
                status: status.as_u16(),
                body: truncate(&body, 500).to_string(),
            });
        }

        let parsed: OrderResponse = response
            .json()
            .await
            .map_err(|e| TopupError::CreateFailed(e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(TopupError::CreateFailed(error));
        }

        info!(custom_id = %custom_id, "Top-up order created");
        Ok(custom_id)
    }

    /// Pay (execute) a previously created top-up order.
    #[instrument(skip(self), fields(custom_id = %custom_id))]
    pub async fn pay_order(&self, custom_id: &str) -> Result<(), TopupError> {
        let timer = metrics::timer_topup();

        let response = self
            .post_authed(
                "pay_order",
                &serde_json::json!({ "custom_id": custom_id }),
            )
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TopupError::ServiceStatus {
                status: status.as_u16(),
                body: truncate(&body, 500).to_string(),
            });
        }

        let parsed: OrderResponse =
            response
                .json()
                .await
                .map_err(|e| TopupError::PayFailed {
                    custom_id: custom_id.to_string(),
                    reason: e.to_string(),
                })?;

        if let Some(error) = parsed.error {
            return Err(TopupError::PayFailed {
                custom_id: custom_id.to_string(),
                reason: error,
            });
        }

        drop(timer);
        info!("Top-up order paid");
        Ok(())
    }

    /// Current service balance in USD.
    #[instrument(skip(self))]
    pub async fn check_balance(&self) -> Result<Decimal, TopupError> {
        let timer = metrics::timer_balance_check();

        let response = self
            .post_authed("check_balance", &serde_json::json!({}))
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TopupError::BalanceFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate(&body, 200)
            )));
        }

        let parsed: BalanceResponse = response
            .json()
            .await
            .map_err(|e| TopupError::BalanceFailed(e.to_string()))?;

        drop(timer);
        let balance = parsed.balance();
        debug!(balance = %balance, "Retrieved service balance");
        Ok(balance)
    }
}

impl super::TopupService for TopupClient {
    async fn check_login(&self, login: &str) -> Result<bool, TopupError> {
        TopupClient::check_login(self, login).await
    }

    async fn convert_to_usd(
        &self,
        currency: Currency,
        amount: Decimal,
    ) -> Result<Decimal, TopupError> {
        TopupClient::convert_to_usd(self, currency, amount).await
    }

    async fn create_order(&self, login: &str, usd_amount: Decimal) -> Result<String, TopupError> {
        TopupClient::create_order(self, login, usd_amount).await
    }

    async fn pay_order(&self, custom_id: &str) -> Result<(), TopupError> {
        TopupClient::pay_order(self, custom_id).await
    }

    async fn check_balance(&self) -> Result<Decimal, TopupError> {
        TopupClient::check_balance(self).await
    }
}

/// Whether a status means the bearer token was rejected and a re-auth is
/// worth one retry.
fn token_rejected(status: u16) -> bool {
    matches!(status, 401 | 403)
}

/// Truncate a response body for error messages.
fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation_works() {
        let config = Config::for_tests();
        let client = TopupClient::new(&config);
        assert_eq!(client.base_url(), config.steam_api_url);
    }

    #[test]
    fn reauth_triggers_on_both_rejection_statuses() {
        assert!(token_rejected(401));
        assert!(token_rejected(403));
        assert!(!token_rejected(400));
        assert!(!token_rejected(429));
        assert!(!token_rejected(500));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("hi", 10), "hi");
        assert_eq!(truncate("приветствие", 6), "привет");
    }
}
