//! Reconciliation behavior tests over the mock clients.

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

use funpay_steam_bot::config::Config;
use funpay_steam_bot::funpay::{Listing, MockFunpayClient, Order};
use funpay_steam_bot::orders::{
    should_deactivate, validate_order, BuyerSession, SessionStep, TopupExecutor, TopupOutcome,
};
use funpay_steam_bot::steam::{Currency, MockTopupClient, MockTopupConfig};

const CATEGORY_ID: u64 = 1086;

fn live_config() -> Config {
    Config {
        funpay_auth_token: "golden-key".to_string(),
        steam_api_user: "user".to_string(),
        steam_api_pass: "pass".to_string(),
        min_balance: dec!(5),
        auto_refund: true,
        auto_deactivate: true,
        category_id: CATEGORY_ID,
        poll_interval_secs: 3,
        dry_run: false,
        steam_api_url: "https://steam-topup.example/api".to_string(),
        funpay_api_url: "https://funpay.com/api".to_string(),
        request_timeout_ms: 20_000,
        http_pool_size: 10,
        port: 8080,
        metrics_enabled: false,
        metrics_port: 9090,
        rust_log: "info".to_string(),
        verbose: false,
    }
}

fn session(order_id: &str) -> BuyerSession {
    BuyerSession {
        order_id: order_id.to_string(),
        chat_id: 42,
        amount: dec!(100),
        currency: Currency::RUB,
        usd_amount: dec!(1.23),
        step: SessionStep::ConfirmingLogin {
            login: "gabelogannewell".to_string(),
        },
    }
}

fn listing(id: u64, active: bool) -> Listing {
    Listing {
        id,
        category_id: CATEGORY_ID,
        title: Some("Steam wallet top-up".to_string()),
        active,
    }
}

fn order(id: &str, description: &str, quantity: Option<rust_decimal::Decimal>) -> Order {
    Order {
        id: id.to_string(),
        buyer_id: 7,
        chat_id: Some(42),
        subcategory_id: Some(CATEGORY_ID),
        title: Some("Steam Wallet".to_string()),
        description: Some(description.to_string()),
        quantity,
    }
}

/// Low balance plus the auto-deactivate flag empties the category.
#[tokio::test]
async fn low_balance_deactivates_every_active_listing() {
    let steam = MockTopupClient::new();
    steam.set_balance(dec!(2.50));

    let funpay = MockFunpayClient::new();
    funpay.add_listing(listing(1, true));
    funpay.add_listing(listing(2, true));
    funpay.add_listing(listing(3, false));

    let balance = steam.check_balance().await.unwrap();
    assert!(should_deactivate(balance, dec!(5), true));

    let count = funpay.deactivate_category(CATEGORY_ID).await.unwrap();
    assert_eq!(count, 2);
    assert!(funpay.listings().iter().all(|l| !l.active));
}

/// A healthy balance leaves listings alone.
#[tokio::test]
async fn healthy_balance_keeps_listings_active() {
    let steam = MockTopupClient::new();
    steam.set_balance(dec!(50));

    let balance = steam.check_balance().await.unwrap();
    assert!(!should_deactivate(balance, dec!(5), true));
}

/// The auto-deactivate flag gates the guard even when balance is low.
#[tokio::test]
async fn guard_disabled_keeps_listings_active() {
    let steam = MockTopupClient::new();
    steam.set_balance(dec!(0.01));

    let balance = steam.check_balance().await.unwrap();
    assert!(!should_deactivate(balance, dec!(5), false));
}

/// Orders that fail validation are refundable without touching the
/// top-up service.
#[tokio::test]
async fn invalid_orders_refund_without_service_calls() {
    let steam = MockTopupClient::new();
    let funpay = MockFunpayClient::new();

    for bad in [
        order("o-1", "steam wallet, no currency marker", None),
        order("o-2", "steam_wallet: eur", Some(dec!(100))),
        order("o-3", "steam_wallet: rub", Some(dec!(5))), // below 15 RUB minimum
    ] {
        assert!(validate_order(&bad, CATEGORY_ID).is_err());
        funpay.refund(&bad.id).await.unwrap();
    }

    assert_eq!(funpay.refunds(), ["o-1", "o-2", "o-3"].map(String::from));
    assert!(steam.created_orders().is_empty());
    assert!(steam.paid_orders().is_empty());
}

/// The happy path: validated order, eligible login, created and paid
/// service order with the USD amount rounded to cents.
#[tokio::test]
async fn valid_order_tops_up_for_the_converted_amount() {
    let steam = MockTopupClient::with_config(MockTopupConfig {
        usd_rate: Some(dec!(0.0123)),
        ..Default::default()
    });
    steam.add_valid_login("gabelogannewell");

    let order = order("o-10", "steam_wallet: rub", Some(dec!(100)));
    let request = validate_order(&order, CATEGORY_ID).unwrap();
    assert_eq!(request.currency, Currency::RUB);

    assert!(steam.check_login("gabelogannewell").await.unwrap());

    let usd = steam
        .convert_to_usd(request.currency, request.amount)
        .await
        .unwrap();
    assert_eq!(usd, dec!(1.23));

    let custom_id = steam.create_order("gabelogannewell", usd).await.unwrap();
    steam.pay_order(&custom_id).await.unwrap();

    let created = steam.created_orders();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].1, "gabelogannewell");
    assert_eq!(created[0].2, dec!(1.23));
    assert_eq!(steam.paid_orders(), vec![custom_id]);
}

/// A failed payment runs the full reconciliation: balance guard, refund,
/// no completion.
#[tokio::test]
async fn failed_payment_triggers_refund_not_completion() {
    let steam = MockTopupClient::with_config(MockTopupConfig {
        balance: dec!(1), // below the $5 threshold
        fail_pay_status: Some(502),
        ..Default::default()
    });
    steam.add_valid_login("gabelogannewell");

    let funpay = MockFunpayClient::new();
    funpay.add_listing(listing(1, true));

    let mut executor = TopupExecutor::new(&live_config());
    let outcome = executor
        .execute(&steam, &funpay, &session("o-20"), "gabelogannewell")
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        TopupOutcome::Failed {
            refunded: true,
            listings_deactivated: 1,
            ..
        }
    ));
    assert!(funpay.listings().iter().all(|l| !l.active));
    assert_eq!(funpay.refunds(), vec!["o-20".to_string()]);
    assert!(funpay.completions().is_empty());
    assert!(steam.paid_orders().is_empty());
}

/// With AUTO_REFUND off, a failed top-up leaves the marketplace order
/// untouched.
#[tokio::test]
async fn failed_payment_without_auto_refund_keeps_the_order() {
    let steam = MockTopupClient::with_config(MockTopupConfig {
        balance: dec!(50),
        fail_pay_status: Some(502),
        ..Default::default()
    });
    steam.add_valid_login("gabelogannewell");

    let funpay = MockFunpayClient::new();
    funpay.add_listing(listing(1, true));

    let mut config = live_config();
    config.auto_refund = false;

    let mut executor = TopupExecutor::new(&config);
    let outcome = executor
        .execute(&steam, &funpay, &session("o-21"), "gabelogannewell")
        .await
        .unwrap();

    assert!(matches!(outcome, TopupOutcome::Failed { refunded: false, .. }));
    assert!(funpay.refunds().is_empty());
    // Healthy balance: listings stay up
    assert!(funpay.listings().iter().all(|l| l.active));
}
