//! Marketplace API client.

use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::FunpayError;
use crate::metrics;

use super::types::{Event, EventsResponse, Listing, Order};

/// FunPay marketplace client.
///
/// Authenticates every request with the session token taken from
/// configuration; the client never acquires a session on its own.
#[derive(Debug, Clone)]
pub struct FunpayClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Marketplace API base URL.
    base_url: String,
    /// Session token ("golden key").
    auth_token: String,
}

impl FunpayClient {
    /// Create a new marketplace client from config.
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
            base_url: config.funpay_api_url.clone(),
            auth_token: config.funpay_auth_token.clone(),
        }
    }

    fn auth_cookie(&self) -> String {
        format!("golden_key={}", self.auth_token)
    }

    async fn check_status(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, FunpayError> {
        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(FunpayError::Unauthorized);
        }
        if !status.is_success() {
            return Err(FunpayError::RequestFailed {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// Poll for events since the given cursor. Returns the events and the
    /// cursor to resume from.
    #[instrument(skip(self))]
    pub async fn poll_events(
        &self,
        cursor: Option<&str>,
    ) -> Result<(Vec<Event>, Option<String>), FunpayError> {
        let url = format!("{}/events", self.base_url);

        let mut request = self.http.get(&url).header("cookie", self.auth_cookie());
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let response = self.check_status("events", request.send().await?).await?;

        let parsed: EventsResponse = response
            .json()
            .await
            .map_err(|e| FunpayError::ParseError(format!("events: {}", e)))?;

        debug!(count = parsed.events.len(), "Polled marketplace events");
        Ok((parsed.events, parsed.cursor))
    }

    /// Fetch a full order by id.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: &str) -> Result<Order, FunpayError> {
        let url = format!("{}/orders/{}", self.base_url, order_id);

        let response = self
            .http
            .get(&url)
            .header("cookie", self.auth_cookie())
            .send()
            .await?;

        if response.status().as_u16() == 404 {
            return Err(FunpayError::OrderNotFound {
                order_id: order_id.to_string(),
            });
        }
        let response = self.check_status("orders", response).await?;

        response
            .json()
            .await
            .map_err(|e| FunpayError::ParseError(format!("order {}: {}", order_id, e)))
    }

    /// Send a chat message to a buyer.
    #[instrument(skip(self, text), fields(chat_id = chat_id))]
    pub async fn send_message(&self, chat_id: u64, text: &str) -> Result<(), FunpayError> {
        let url = format!("{}/chats/{}/messages", self.base_url, chat_id);

        let response = self
            .http
            .post(&url)
            .header("cookie", self.auth_cookie())
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;

        self.check_status("messages", response).await?;
        debug!("Message sent");
        Ok(())
    }

    /// Refund a marketplace order to the buyer.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn refund(&self, order_id: &str) -> Result<(), FunpayError> {
        let url = format!("{}/orders/{}/refund", self.base_url, order_id);

        let response = self
            .http
            .post(&url)
            .header("cookie", self.auth_cookie())
            .send()
            .await?;

        self.check_status("refund", response).await?;
        metrics::inc_refunds_issued();
        info!("Order refunded");
        Ok(())
    }

    /// Mark a marketplace order as completed.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn complete_order(&self, order_id: &str) -> Result<(), FunpayError> {
        let url = format!("{}/orders/{}/complete", self.base_url, order_id);

        let response = self
            .http
            .post(&url)
            .header("cookie", self.auth_cookie())
            .send()
            .await?;

        self.check_status("complete", response).await?;
        info!("Order completed");
        Ok(())
    }

    /// List own listings in a subcategory.
    #[instrument(skip(self))]
    pub async fn category_listings(&self, category_id: u64) -> Result<Vec<Listing>, FunpayError> {
        let url = format!("{}/categories/{}/listings", self.base_url, category_id);

        let response = self
            .http
            .get(&url)
            .header("cookie", self.auth_cookie())
            .send()
            .await?;
        let response = self.check_status("listings", response).await?;

        response
            .json()
            .await
            .map_err(|e| FunpayError::ParseError(format!("listings: {}", e)))
    }

    /// Persist a listing, including its active flag.
    #[instrument(skip(self, listing), fields(listing_id = listing.id))]
    pub async fn save_listing(&self, listing: &Listing) -> Result<(), FunpayError> {
        let url = format!("{}/listings/{}", self.base_url, listing.id);

        let response = self
            .http
            .put(&url)
            .header("cookie", self.auth_cookie())
            .json(listing)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FunpayError::ListingUpdateFailed {
                listing_id: listing.id,
                reason: format!("HTTP {}", status.as_u16()),
            });
        }
        Ok(())
    }

    /// Deactivate every active listing in a subcategory. Returns how many
    /// listings were flipped.
    #[instrument(skip(self))]
    pub async fn deactivate_category(&self, category_id: u64) -> Result<u64, FunpayError> {
        let listings = self.category_listings(category_id).await?;
        let mut deactivated = 0u64;

        for mut listing in listings {
            if !listing.active {
                continue;
            }
            listing.active = false;
            match self.save_listing(&listing).await {
                Ok(()) => {
                    deactivated += 1;
                    metrics::inc_listings_deactivated();
                    info!(listing_id = listing.id, "Listing deactivated");
                }
                Err(e) => {
                    warn!(listing_id = listing.id, error = %e, "Failed to deactivate listing");
                }
            }
        }

        warn!(category_id, deactivated, "Category deactivation finished");
        Ok(deactivated)
    }
}

impl super::Marketplace for FunpayClient {
    async fn send_message(&self, chat_id: u64, text: &str) -> Result<(), FunpayError> {
        FunpayClient::send_message(self, chat_id, text).await
    }

    async fn refund(&self, order_id: &str) -> Result<(), FunpayError> {
        FunpayClient::refund(self, order_id).await
    }

    async fn complete_order(&self, order_id: &str) -> Result<(), FunpayError> {
        FunpayClient::complete_order(self, order_id).await
    }

    async fn deactivate_category(&self, category_id: u64) -> Result<u64, FunpayError> {
        FunpayClient::deactivate_category(self, category_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation_works() {
        let config = Config::for_tests();
        let client = FunpayClient::new(&config);
        assert_eq!(client.auth_cookie(), "golden_key=golden-key");
    }
}
