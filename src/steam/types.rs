//! Types for the Steam wallet top-up service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Wallet currency accepted for top-ups.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(ascii_case_insensitive)]
pub enum Currency {
    /// Russian ruble.
    #[default]
    RUB,
    /// Kazakhstani tenge.
    KZT,
    /// Ukrainian hryvnia.
    UAH,
    /// US dollar.
    USD,
}

impl Currency {
    /// Minimum top-up amount the service accepts for this currency.
    pub fn min_amount(&self) -> Decimal {
        match self {
            Currency::RUB => Decimal::new(15, 0),
            Currency::KZT => Decimal::new(80, 0),
            Currency::UAH => Decimal::new(7, 0),
            Currency::USD => Decimal::new(15, 2), // 0.15
        }
    }
}

/// Auth request body for `/token`.
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest {
    /// Service username.
    pub username: String,
    /// Service password.
    pub password: String,
}

/// Auth response from `/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for subsequent calls.
    pub access_token: Option<String>,
}

/// Login check request body for `/check`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckLoginRequest {
    /// Steam login to validate.
    pub login: String,
}

/// Login check response from `/check`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckLoginResponse {
    /// Whether the login can be topped up.
    #[serde(default)]
    pub result: bool,
}

/// Conversion request body for `/rates`.
#[derive(Debug, Clone, Serialize)]
pub struct RatesRequest {
    /// Source currency code.
    pub primary_currency: Currency,
    /// Amount in the source currency.
    pub amount: Decimal,
}

/// Conversion response from `/rates`.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesResponse {
    /// Equivalent amount in USD.
    pub usd_price: Option<Decimal>,
}

/// Top-up order creation request body for `/create_order`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    /// Service product id (1 = Steam wallet top-up).
    pub service_id: u32,
    /// USD amount, rounded to 2 decimal places.
    pub quantity: Decimal,
    /// Client-generated correlation id (UUIDv4).
    pub custom_id: String,
    /// Target Steam login.
    pub data: String,
}

/// Generic order response from `/create_order` and `/pay_order`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderResponse {
    /// Error message when the service rejects the order.
    pub error: Option<String>,
    /// Human-readable status message, if any.
    pub message: Option<String>,
}

/// Balance response from `/check_balance`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BalanceResponse {
    /// Object form: `{"balance": 12.5}`.
    Object {
        /// Balance in USD.
        balance: Decimal,
    },
    /// Bare number form: `12.5`.
    Bare(Decimal),
}

impl BalanceResponse {
    /// Balance in USD regardless of the wire shape.
    pub fn balance(&self) -> Decimal {
        match self {
            BalanceResponse::Object { balance } => *balance,
            BalanceResponse::Bare(balance) => *balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn currency_parses_case_insensitively() {
        assert_eq!(Currency::from_str("rub").unwrap(), Currency::RUB);
        assert_eq!(Currency::from_str("UAH").unwrap(), Currency::UAH);
        assert_eq!(Currency::from_str("Usd").unwrap(), Currency::USD);
        assert!(Currency::from_str("eur").is_err());
    }

    #[test]
    fn currency_minimums_match_service_limits() {
        assert_eq!(Currency::RUB.min_amount(), dec!(15));
        assert_eq!(Currency::KZT.min_amount(), dec!(80));
        assert_eq!(Currency::UAH.min_amount(), dec!(7));
        assert_eq!(Currency::USD.min_amount(), dec!(0.15));
    }

    #[test]
    fn balance_response_accepts_both_shapes() {
        let object: BalanceResponse = serde_json::from_str(r#"{"balance": "12.50"}"#).unwrap();
        assert_eq!(object.balance(), dec!(12.50));

        let bare: BalanceResponse = serde_json::from_str("7.25").unwrap();
        assert_eq!(bare.balance(), dec!(7.25));
    }
}
