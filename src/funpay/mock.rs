//! Mock marketplace client for unit testing.
//!
//! Mirrors the [`FunpayClient`](super::client::FunpayClient) surface and
//! records every side effect so tests can assert on them.

use std::sync::{Arc, Mutex};

use crate::error::FunpayError;

use super::types::{Event, Listing, Order};

/// Mock marketplace client for testing.
#[derive(Debug, Clone, Default)]
pub struct MockFunpayClient {
    /// Orders known to the marketplace, by id.
    orders: Arc<Mutex<Vec<Order>>>,
    /// Listings across all categories.
    listings: Arc<Mutex<Vec<Listing>>>,
    /// Queued events for the next poll.
    events: Arc<Mutex<Vec<Event>>>,
    /// Messages sent (chat_id, text).
    sent_messages: Arc<Mutex<Vec<(u64, String)>>>,
    /// Refunded order ids.
    refunds: Arc<Mutex<Vec<String>>>,
    /// Completed order ids.
    completions: Arc<Mutex<Vec<String>>>,
}

impl MockFunpayClient {
    /// Create an empty mock marketplace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an order.
    pub fn add_order(&self, order: Order) {
        self.orders.lock().unwrap().push(order);
    }

    /// Register a listing.
    pub fn add_listing(&self, listing: Listing) {
        self.listings.lock().unwrap().push(listing);
    }

    /// Queue an event for the next poll.
    pub fn push_event(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    /// Messages sent so far (chat_id, text).
    pub fn sent_messages(&self) -> Vec<(u64, String)> {
        self.sent_messages.lock().unwrap().clone()
    }

    /// Order ids refunded so far.
    pub fn refunds(&self) -> Vec<String> {
        self.refunds.lock().unwrap().clone()
    }

    /// Order ids completed so far.
    pub fn completions(&self) -> Vec<String> {
        self.completions.lock().unwrap().clone()
    }

    /// Current listing state.
    pub fn listings(&self) -> Vec<Listing> {
        self.listings.lock().unwrap().clone()
    }

    /// Drain queued events, mimicking a poll.
    pub async fn poll_events(
        &self,
        _cursor: Option<&str>,
    ) -> Result<(Vec<Event>, Option<String>), FunpayError> {
        let events = std::mem::take(&mut *self.events.lock().unwrap());
        Ok((events, None))
    }

    /// Fetch an order by id.
    pub async fn get_order(&self, order_id: &str) -> Result<Order, FunpayError> {
        self.orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
            .ok_or_else(|| FunpayError::OrderNotFound {
                order_id: order_id.to_string(),
            })
    }

    /// Record a chat message.
    pub async fn send_message(&self, chat_id: u64, text: &str) -> Result<(), FunpayError> {
        self.sent_messages
            .lock()
            .unwrap()
            .push((chat_id, text.to_string()));
        Ok(())
    }

    /// Record a refund.
    pub async fn refund(&self, order_id: &str) -> Result<(), FunpayError> {
        self.refunds.lock().unwrap().push(order_id.to_string());
        Ok(())
    }

    /// Record a completion.
    pub async fn complete_order(&self, order_id: &str) -> Result<(), FunpayError> {
        self.completions.lock().unwrap().push(order_id.to_string());
        Ok(())
    }

    /// Listings in a subcategory.
    pub async fn category_listings(&self, category_id: u64) -> Result<Vec<Listing>, FunpayError> {
        Ok(self
            .listings
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.category_id == category_id)
            .cloned()
            .collect())
    }

    /// Persist a listing.
    pub async fn save_listing(&self, listing: &Listing) -> Result<(), FunpayError> {
        let mut listings = self.listings.lock().unwrap();
        match listings.iter_mut().find(|l| l.id == listing.id) {
            Some(stored) => {
                *stored = listing.clone();
                Ok(())
            }
            None => Err(FunpayError::ListingUpdateFailed {
                listing_id: listing.id,
                reason: "unknown listing".to_string(),
            }),
        }
    }

    /// Deactivate every active listing in a subcategory.
    pub async fn deactivate_category(&self, category_id: u64) -> Result<u64, FunpayError> {
        let listings = self.category_listings(category_id).await?;
        let mut deactivated = 0u64;

        for mut listing in listings {
            if !listing.active {
                continue;
            }
            listing.active = false;
            self.save_listing(&listing).await?;
            deactivated += 1;
        }

        Ok(deactivated)
    }
}

impl super::Marketplace for MockFunpayClient {
    async fn send_message(&self, chat_id: u64, text: &str) -> Result<(), FunpayError> {
        MockFunpayClient::send_message(self, chat_id, text).await
    }

    async fn refund(&self, order_id: &str) -> Result<(), FunpayError> {
        MockFunpayClient::refund(self, order_id).await
    }

    async fn complete_order(&self, order_id: &str) -> Result<(), FunpayError> {
        MockFunpayClient::complete_order(self, order_id).await
    }

    async fn deactivate_category(&self, category_id: u64) -> Result<u64, FunpayError> {
        MockFunpayClient::deactivate_category(self, category_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: u64, category_id: u64, active: bool) -> Listing {
        Listing {
            id,
            category_id,
            title: None,
            active,
        }
    }

    #[tokio::test]
    async fn deactivate_category_flips_only_active_listings_in_category() {
        let client = MockFunpayClient::new();
        client.add_listing(listing(1, 1086, true));
        client.add_listing(listing(2, 1086, false));
        client.add_listing(listing(3, 999, true));

        let count = client.deactivate_category(1086).await.unwrap();
        assert_eq!(count, 1);

        let listings = client.listings();
        assert!(!listings.iter().find(|l| l.id == 1).unwrap().active);
        assert!(!listings.iter().find(|l| l.id == 2).unwrap().active);
        // Other category untouched
        assert!(listings.iter().find(|l| l.id == 3).unwrap().active);
    }

    #[tokio::test]
    async fn poll_events_drains_queue() {
        let client = MockFunpayClient::new();
        client.push_event(Event::NewOrder {
            order_id: "o-1".to_string(),
        });

        let (events, _) = client.poll_events(None).await.unwrap();
        assert_eq!(events.len(), 1);

        let (events, _) = client.poll_events(None).await.unwrap();
        assert!(events.is_empty());
    }
}
