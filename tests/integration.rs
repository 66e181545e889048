//! Integration tests against the real top-up service.
//!
//! These tests require valid STEAM_API_USER/STEAM_API_PASS environment
//! variables. Run with: cargo test --test integration -- --ignored
//!
//! Note: These tests interact with the real top-up API.

use funpay_steam_bot::config::Config;
use funpay_steam_bot::steam::TopupClient;

/// Get a test config from environment.
fn test_config() -> Option<Config> {
    dotenvy::dotenv().ok();

    let user = std::env::var("STEAM_API_USER").ok()?;
    let pass = std::env::var("STEAM_API_PASS").ok()?;

    // Skip placeholder credentials
    if user.is_empty() || pass.is_empty() || user == "changeme" {
        return None;
    }

    std::env::set_var("FUNPAY_AUTH_TOKEN", "integration-test");
    Config::load().ok()
}

/// Test that authentication yields a usable token.
#[tokio::test]
#[ignore = "requires STEAM_API_USER/STEAM_API_PASS"]
async fn test_authenticate() {
    let config = match test_config() {
        Some(c) => c,
        None => {
            println!("Skipping: STEAM_API_USER/STEAM_API_PASS not set");
            return;
        }
    };

    let client = TopupClient::new(&config);
    client.authenticate().await.expect("authentication failed");
}

/// Test that the balance endpoint answers with a non-negative number.
#[tokio::test]
#[ignore = "requires STEAM_API_USER/STEAM_API_PASS"]
async fn test_check_balance() {
    let config = match test_config() {
        Some(c) => c,
        None => {
            println!("Skipping: STEAM_API_USER/STEAM_API_PASS not set");
            return;
        }
    };

    let client = TopupClient::new(&config);
    client.authenticate().await.expect("authentication failed");

    let balance = client.check_balance().await.expect("balance check failed");
    assert!(balance >= rust_decimal::Decimal::ZERO);
    println!("Service balance: ${}", balance);
}

/// Test that an obviously bogus login is rejected.
#[tokio::test]
#[ignore = "requires STEAM_API_USER/STEAM_API_PASS"]
async fn test_check_login_rejects_garbage() {
    let config = match test_config() {
        Some(c) => c,
        None => {
            println!("Skipping: STEAM_API_USER/STEAM_API_PASS not set");
            return;
        }
    };

    let client = TopupClient::new(&config);
    client.authenticate().await.expect("authentication failed");

    let eligible = client
        .check_login("no-such-login-4f9a2c81")
        .await
        .expect("login check failed");
    assert!(!eligible);
}
