//! Per-buyer dialog sessions.
//!
//! After an order is accepted the bot converses with the buyer: ask for the
//! Steam login, confirm it, execute, then wait for the buyer to confirm the
//! credit arrived. One session per buyer, keyed by buyer id.

use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::steam::Currency;

/// Step of the buyer dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStep {
    /// Waiting for the buyer to send their Steam login.
    AwaitingLogin,
    /// Login validated; waiting for the buyer to confirm with `+` or send a
    /// different login.
    ConfirmingLogin {
        /// The validated login.
        login: String,
    },
    /// Top-up performed; waiting for the buyer to confirm the credit.
    AwaitingTopupConfirm {
        /// The login that was topped up.
        login: String,
    },
}

/// State of one buyer's order dialog.
#[derive(Debug, Clone)]
pub struct BuyerSession {
    /// Marketplace order id the dialog serves.
    pub order_id: String,
    /// Chat to reach the buyer.
    pub chat_id: u64,
    /// Amount in the wallet currency.
    pub amount: Decimal,
    /// Wallet currency.
    pub currency: Currency,
    /// Equivalent amount in USD.
    pub usd_amount: Decimal,
    /// Current dialog step.
    pub step: SessionStep,
}

/// Concurrent store of buyer sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<u64, BuyerSession>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Open (or replace) the session for a buyer.
    pub fn open(&self, buyer_id: u64, session: BuyerSession) {
        self.sessions.insert(buyer_id, session);
    }

    /// Snapshot a buyer's session.
    pub fn get(&self, buyer_id: u64) -> Option<BuyerSession> {
        self.sessions.get(&buyer_id).map(|s| s.clone())
    }

    /// Advance a buyer's session to a new step.
    pub fn advance(&self, buyer_id: u64, step: SessionStep) {
        if let Some(mut session) = self.sessions.get_mut(&buyer_id) {
            session.step = step;
        }
    }

    /// Close a buyer's session.
    pub fn close(&self, buyer_id: u64) {
        self.sessions.remove(&buyer_id);
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn session() -> BuyerSession {
        BuyerSession {
            order_id: "o-1".to_string(),
            chat_id: 42,
            amount: dec!(100),
            currency: Currency::RUB,
            usd_amount: dec!(1.20),
            step: SessionStep::AwaitingLogin,
        }
    }

    #[test]
    fn store_open_get_close() {
        let store = SessionStore::new();
        assert!(store.is_empty());

        store.open(7, session());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(7).unwrap().order_id, "o-1");
        assert!(store.get(8).is_none());

        store.close(7);
        assert!(store.is_empty());
    }

    #[test]
    fn advance_moves_session_through_steps() {
        let store = SessionStore::new();
        store.open(7, session());

        store.advance(
            7,
            SessionStep::ConfirmingLogin {
                login: "gabelogannewell".to_string(),
            },
        );
        assert!(matches!(
            store.get(7).unwrap().step,
            SessionStep::ConfirmingLogin { .. }
        ));

        store.advance(
            7,
            SessionStep::AwaitingTopupConfirm {
                login: "gabelogannewell".to_string(),
            },
        );
        assert!(matches!(
            store.get(7).unwrap().step,
            SessionStep::AwaitingTopupConfirm { .. }
        ));
    }

    #[test]
    fn advance_unknown_buyer_is_noop() {
        let store = SessionStore::new();
        store.advance(1, SessionStep::AwaitingLogin);
        assert!(store.is_empty());
    }
}
