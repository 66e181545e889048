//! Order validation: currency and amount extraction.
//!
//! Listings declare their wallet currency in the description as
//! `steam_wallet: rub|uah|kzt|usd`. The top-up amount usually arrives as the
//! structured order quantity; when it does not, it is recovered from the
//! order text with prioritized patterns.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::OrderError;
use crate::funpay::Order;
use crate::steam::Currency;

/// Marker that precedes the wallet currency in a listing description.
const CURRENCY_MARKER: &str = "steam_wallet:";

static FIRST_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)").expect("valid regex"));

/// Amount patterns in priority order. Labeled keywords win over bare
/// currency-suffixed numbers; a bare first number is the last resort.
static AMOUNT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:amount|quantity|qty)\D{0,60}?(\d+(?:[.,]\d+)?)",
        r"(?:количеств(?:о|о:)|кол-во|кол:)\D{0,60}?(\d+(?:[.,]\d+)?)",
        r"(?:top-?up|пополнение|wallet|steam_wallet)\D{0,60}?(\d+(?:[.,]\d+)?)",
        r"(\d+(?:[.,]\d+)?)\s*(?:rub|uah|kzt|usd|руб|грн|тенге|\$|₽|₸)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Where a parsed amount came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountSource {
    /// Structured quantity field on the order.
    Structured,
    /// Matched one of the prioritized text patterns.
    Pattern,
    /// First number found anywhere in the text.
    FirstNumber,
}

/// A validated top-up request, ready for USD conversion.
#[derive(Debug, Clone)]
pub struct TopupRequest {
    /// Marketplace order id.
    pub order_id: String,
    /// Buyer account id.
    pub buyer_id: u64,
    /// Chat to reach the buyer.
    pub chat_id: Option<u64>,
    /// Amount in the wallet currency.
    pub amount: Decimal,
    /// Wallet currency.
    pub currency: Currency,
}

/// Extract the wallet currency declared after `steam_wallet:`.
pub fn parse_currency(text: &str) -> Result<Currency, OrderError> {
    let idx = text.find(CURRENCY_MARKER).ok_or(OrderError::MissingCurrency)?;
    let rest = &text[idx + CURRENCY_MARKER.len()..];
    let raw = rest
        .split_whitespace()
        .next()
        .ok_or(OrderError::MissingCurrency)?;

    Currency::from_str(raw).map_err(|_| OrderError::UnsupportedCurrency(raw.to_string()))
}

fn decimal_from_match(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&raw.replace(',', ".")).ok()
}

/// Extract the top-up amount from an order.
pub fn parse_amount(order: &Order) -> Result<(Decimal, AmountSource), OrderError> {
    if let Some(quantity) = order.quantity {
        if quantity > Decimal::ZERO {
            return Ok((quantity, AmountSource::Structured));
        }
    }

    let text = order.description_text();
    if text.trim().is_empty() {
        return Err(OrderError::AmountNotFound);
    }

    for pattern in AMOUNT_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(&text) {
            if let Some(amount) = captures.get(1).and_then(|m| decimal_from_match(m.as_str())) {
                return Ok((amount, AmountSource::Pattern));
            }
        }
    }

    FIRST_NUMBER
        .captures(&text)
        .and_then(|c| c.get(1))
        .and_then(|m| decimal_from_match(m.as_str()))
        .map(|amount| (amount, AmountSource::FirstNumber))
        .ok_or(OrderError::AmountNotFound)
}

/// Validate a new order end to end: category, currency, amount, minimum.
pub fn validate_order(order: &Order, category_id: u64) -> Result<TopupRequest, OrderError> {
    if order.subcategory_id != Some(category_id) {
        return Err(OrderError::WrongCategory {
            got: order.subcategory_id,
            expected: category_id,
        });
    }

    let currency = parse_currency(&order.description_text())?;
    let (amount, _source) = parse_amount(order)?;

    let minimum = currency.min_amount();
    if amount < minimum {
        return Err(OrderError::BelowMinimum {
            amount,
            currency,
            minimum,
        });
    }

    Ok(TopupRequest {
        order_id: order.id.clone(),
        buyer_id: order.buyer_id,
        chat_id: order.chat_id,
        amount,
        currency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn order(description: &str, quantity: Option<Decimal>) -> Order {
        Order {
            id: "o-1".to_string(),
            buyer_id: 7,
            chat_id: Some(42),
            subcategory_id: Some(1086),
            title: None,
            description: Some(description.to_string()),
            quantity,
        }
    }

    #[test]
    fn currency_parses_from_marker() {
        assert_eq!(
            parse_currency("top-up offer steam_wallet: rub fast delivery").unwrap(),
            Currency::RUB
        );
        assert_eq!(parse_currency("steam_wallet: usd").unwrap(), Currency::USD);
    }

    #[test]
    fn currency_missing_marker_is_rejected() {
        assert!(matches!(
            parse_currency("steam wallet top-up"),
            Err(OrderError::MissingCurrency)
        ));
    }

    #[test]
    fn currency_unknown_code_is_rejected() {
        assert!(matches!(
            parse_currency("steam_wallet: eur"),
            Err(OrderError::UnsupportedCurrency(_))
        ));
    }

    #[test]
    fn amount_prefers_structured_quantity() {
        let order = order("steam_wallet: rub quantity: 500", Some(dec!(100)));
        let (amount, source) = parse_amount(&order).unwrap();
        assert_eq!(amount, dec!(100));
        assert_eq!(source, AmountSource::Structured);
    }

    #[test]
    fn amount_falls_back_to_labeled_pattern() {
        let order = order("steam_wallet: rub quantity: 250", None);
        let (amount, source) = parse_amount(&order).unwrap();
        assert_eq!(amount, dec!(250));
        assert_eq!(source, AmountSource::Pattern);
    }

    #[test]
    fn amount_parses_comma_decimals() {
        let order = order("top-up 10,5 usd", None);
        let (amount, _) = parse_amount(&order).unwrap();
        assert_eq!(amount, dec!(10.5));
    }

    #[test]
    fn amount_uses_currency_suffixed_number() {
        let order = order("steam_wallet: uah 120 uah wallet refill", None);
        let (amount, _) = parse_amount(&order).unwrap();
        assert_eq!(amount, dec!(120));
    }

    #[test]
    fn amount_missing_is_rejected() {
        let order = order("steam_wallet: rub wallet refill", None);
        assert!(matches!(parse_amount(&order), Err(OrderError::AmountNotFound)));
    }

    #[test]
    fn validate_accepts_complete_order() {
        let order = order("steam_wallet: rub", Some(dec!(100)));
        let request = validate_order(&order, 1086).unwrap();
        assert_eq!(request.currency, Currency::RUB);
        assert_eq!(request.amount, dec!(100));
        assert_eq!(request.buyer_id, 7);
    }

    #[test]
    fn validate_rejects_wrong_category() {
        let order = order("steam_wallet: rub", Some(dec!(100)));
        assert!(matches!(
            validate_order(&order, 2000),
            Err(OrderError::WrongCategory { .. })
        ));
    }

    #[test]
    fn validate_enforces_currency_minimum() {
        let order = order("steam_wallet: rub", Some(dec!(10)));
        assert!(matches!(
            validate_order(&order, 1086),
            Err(OrderError::BelowMinimum { .. })
        ));

        let order = self::order("steam_wallet: usd", Some(dec!(0.15)));
        assert!(validate_order(&order, 1086).is_ok());
    }
}
