//! Marketplace types: orders, listings, chat messages, poll events.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A purchase made on the marketplace.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    /// Marketplace order id.
    pub id: String,
    /// Buyer account id.
    pub buyer_id: u64,
    /// Chat to reach the buyer, when open.
    pub chat_id: Option<u64>,
    /// Subcategory the purchased listing belongs to.
    pub subcategory_id: Option<u64>,
    /// Listing title.
    pub title: Option<String>,
    /// Listing description text shown to the buyer.
    pub description: Option<String>,
    /// Quantity as reported by the marketplace, when structured.
    pub quantity: Option<Decimal>,
}

impl Order {
    /// All description-ish text fields joined for free-text parsing,
    /// lowercased.
    pub fn description_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(d) = &self.description {
            parts.push(d.as_str());
        }
        if let Some(t) = &self.title {
            parts.push(t.as_str());
        }
        parts.join(" ").to_lowercase()
    }
}

/// A sellable offer posted on the marketplace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listing {
    /// Listing id.
    pub id: u64,
    /// Subcategory the listing is posted in.
    pub category_id: u64,
    /// Listing title.
    pub title: Option<String>,
    /// Whether the listing is visible to buyers.
    pub active: bool,
}

/// A chat message from a buyer.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    /// Chat the message arrived in.
    pub chat_id: u64,
    /// Author account id.
    pub author_id: u64,
    /// Message text.
    #[serde(default)]
    pub text: String,
}

/// An event returned by the marketplace poll endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A new order was placed.
    NewOrder {
        /// Id of the new order.
        order_id: String,
    },
    /// A new chat message arrived.
    NewMessage {
        /// The message.
        message: ChatMessage,
    },
}

/// Response of the poll endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsResponse {
    /// Events since the supplied cursor.
    #[serde(default)]
    pub events: Vec<Event>,
    /// Cursor to resume polling from.
    pub cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn order_description_text_joins_and_lowercases() {
        let order = Order {
            id: "o-1".to_string(),
            buyer_id: 7,
            chat_id: Some(42),
            subcategory_id: Some(1086),
            title: Some("Steam Wallet".to_string()),
            description: Some("steam_wallet: RUB".to_string()),
            quantity: Some(dec!(100)),
        };

        let text = order.description_text();
        assert!(text.contains("steam_wallet: rub"));
        assert!(text.contains("steam wallet"));
    }

    #[test]
    fn events_deserialize_tagged() {
        let json = r#"{
            "events": [
                {"type": "new_order", "order_id": "o-9"},
                {"type": "new_message", "message": {"chat_id": 1, "author_id": 2, "text": "hi"}}
            ],
            "cursor": "c-17"
        }"#;

        let response: EventsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.events.len(), 2);
        assert_eq!(response.cursor.as_deref(), Some("c-17"));
        assert!(matches!(&response.events[0], Event::NewOrder { order_id } if order_id == "o-9"));
    }
}
