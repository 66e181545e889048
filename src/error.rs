//! Unified error types for the top-up bot.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::steam::Currency;

/// Unified error type for the top-up bot.
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Marketplace-related error.
    #[error("marketplace error: {0}")]
    Funpay(#[from] FunpayError),

    /// Top-up service error.
    #[error("top-up error: {0}")]
    Topup(#[from] TopupError),

    /// Order validation/flow error.
    #[error("order error: {0}")]
    Order(#[from] OrderError),

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Marketplace (FunPay) client errors.
#[derive(Error, Debug)]
pub enum FunpayError {
    /// The marketplace rejected a request.
    #[error("marketplace request failed: HTTP {status} on {endpoint}")]
    RequestFailed {
        /// Endpoint that failed.
        endpoint: String,
        /// HTTP status returned.
        status: u16,
    },

    /// Session token was rejected.
    #[error("marketplace session token rejected")]
    Unauthorized,

    /// Order lookup failed.
    #[error("order {order_id} not found")]
    OrderNotFound {
        /// The missing order id.
        order_id: String,
    },

    /// Listing update failed.
    #[error("failed to update listing {listing_id}: {reason}")]
    ListingUpdateFailed {
        /// Listing id that failed to update.
        listing_id: u64,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to parse a marketplace response.
    #[error("failed to parse marketplace response: {0}")]
    ParseError(String),

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Top-up service errors.
#[derive(Error, Debug)]
pub enum TopupError {
    /// Authentication against the service failed.
    #[error("top-up service authentication failed: {0}")]
    AuthFailed(String),

    /// Auth response did not contain an access token.
    #[error("top-up service auth response missing access_token")]
    MissingToken,

    /// The service answered with a non-success status.
    #[error("top-up service returned HTTP {status}: {body}")]
    ServiceStatus {
        /// HTTP status code.
        status: u16,
        /// Response body excerpt.
        body: String,
    },

    /// Login eligibility check failed.
    #[error("login check failed for {login}: {reason}")]
    LoginCheckFailed {
        /// Login being checked.
        login: String,
        /// Reason for failure.
        reason: String,
    },

    /// Currency conversion failed.
    #[error("failed to convert {amount} {currency} to USD: {reason}")]
    ConversionFailed {
        /// Source currency.
        currency: Currency,
        /// Amount that failed to convert.
        amount: Decimal,
        /// Reason for failure.
        reason: String,
    },

    /// Top-up order creation failed.
    #[error("top-up order creation failed: {0}")]
    CreateFailed(String),

    /// Top-up order payment failed.
    #[error("top-up payment failed for {custom_id}: {reason}")]
    PayFailed {
        /// Correlation id of the order.
        custom_id: String,
        /// Reason for failure.
        reason: String,
    },

    /// Balance check failed.
    #[error("balance check failed: {0}")]
    BalanceFailed(String),

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl TopupError {
    /// The HTTP status behind this error, when one is known.
    pub fn status(&self) -> Option<u16> {
        match self {
            TopupError::ServiceStatus { status, .. } => Some(*status),
            TopupError::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Buyer-facing explanation for a failed top-up, keyed off the
    /// upstream HTTP status.
    pub fn buyer_message(&self) -> &'static str {
        match self.status() {
            Some(401) | Some(403) => {
                "The top-up service rejected our credentials. We are on it; a refund will be issued."
            }
            Some(429) => {
                "The top-up service is overloaded. Please order again a bit later; we will refund this order."
            }
            Some(s) if s >= 500 => {
                "The top-up service is having technical problems. Your money will be refunded."
            }
            Some(s) if s >= 400 => {
                "The request was declined by the top-up service. Your money will be refunded."
            }
            _ => "The request could not be completed. Your money will be refunded.",
        }
    }
}

/// Order validation and dialog-flow errors.
#[derive(Error, Debug)]
pub enum OrderError {
    /// Description did not declare a wallet currency.
    #[error("order description does not declare a wallet currency")]
    MissingCurrency,

    /// Declared currency is not supported.
    #[error("unsupported wallet currency: {0}")]
    UnsupportedCurrency(String),

    /// No top-up amount could be extracted from the order.
    #[error("could not determine top-up amount from order")]
    AmountNotFound,

    /// Amount is below the per-currency minimum.
    #[error("amount {amount} {currency} is below the minimum {minimum}")]
    BelowMinimum {
        /// Requested amount.
        amount: Decimal,
        /// Wallet currency.
        currency: Currency,
        /// Minimum for that currency.
        minimum: Decimal,
    },

    /// Order belongs to a different subcategory.
    #[error("order subcategory {got:?} does not match configured category {expected}")]
    WrongCategory {
        /// Subcategory on the order, if any.
        got: Option<u64>,
        /// Category the bot serves.
        expected: u64,
    },
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, BotError>;
