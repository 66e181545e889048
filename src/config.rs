//! Application configuration loaded from environment variables.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Marketplace Credentials ===
    /// FunPay session token ("golden key").
    pub funpay_auth_token: String,

    // === Top-Up Service Credentials ===
    /// Top-up service username.
    pub steam_api_user: String,

    /// Top-up service password.
    pub steam_api_pass: String,

    // === Reconciliation Parameters ===
    /// Service balance (USD) below which listings are deactivated.
    #[serde(default = "default_min_balance")]
    pub min_balance: Decimal,

    /// Refund marketplace orders automatically when a top-up fails.
    #[serde(default = "default_true")]
    pub auto_refund: bool,

    /// Deactivate listings automatically when balance drops below the minimum.
    #[serde(default = "default_true")]
    pub auto_deactivate: bool,

    /// Marketplace subcategory the bot serves.
    #[serde(default = "default_category_id")]
    pub category_id: u64,

    /// Seconds between marketplace event polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    // === Operation Modes ===
    /// Simulation mode (no real top-ups, no listing mutations).
    #[serde(default = "default_true")]
    pub dry_run: bool,

    // === Endpoints ===
    /// Top-up service base URL.
    #[serde(default = "default_steam_api_url")]
    pub steam_api_url: String,

    /// Marketplace API base URL.
    #[serde(default = "default_funpay_api_url")]
    pub funpay_api_url: String,

    // === HTTP Client ===
    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Connection pool size per host.
    #[serde(default = "default_pool_size")]
    pub http_pool_size: usize,

    // === Server Configuration ===
    /// HTTP server port for health/status endpoints.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable the Prometheus exporter.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Prometheus exporter port.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_min_balance() -> Decimal {
    Decimal::new(5, 0) // $5
}

fn default_true() -> bool {
    true
}

fn default_category_id() -> u64 {
    1086 // Steam wallet top-up subcategory
}

fn default_poll_interval() -> u64 {
    3
}

fn default_steam_api_url() -> String {
    "https://steam-topup.example/api".to_string()
}

fn default_funpay_api_url() -> String {
    "https://funpay.com/api".to_string()
}

fn default_request_timeout_ms() -> u64 {
    20_000
}

fn default_pool_size() -> usize {
    10
}

fn default_port() -> u16 {
    8080
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.funpay_auth_token.is_empty() {
            return Err("FUNPAY_AUTH_TOKEN is required".to_string());
        }

        if self.steam_api_user.is_empty() || self.steam_api_pass.is_empty() {
            return Err("STEAM_API_USER and STEAM_API_PASS are required".to_string());
        }

        if self.min_balance < Decimal::ZERO {
            return Err("MIN_BALANCE must not be negative".to_string());
        }

        if self.poll_interval_secs == 0 {
            return Err("POLL_INTERVAL_SECS must be at least 1".to_string());
        }

        Ok(())
    }

    /// Fully-populated configuration for unit tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            funpay_auth_token: "golden-key".to_string(),
            steam_api_user: "user".to_string(),
            steam_api_pass: "pass".to_string(),
            min_balance: default_min_balance(),
            auto_refund: true,
            auto_deactivate: true,
            category_id: default_category_id(),
            poll_interval_secs: default_poll_interval(),
            dry_run: true,
            steam_api_url: default_steam_api_url(),
            funpay_api_url: default_funpay_api_url(),
            request_timeout_ms: default_request_timeout_ms(),
            http_pool_size: default_pool_size(),
            port: default_port(),
            metrics_enabled: true,
            metrics_port: default_metrics_port(),
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config::for_tests()
    }

    #[test]
    fn default_values_are_sensible() {
        assert_eq!(default_min_balance(), Decimal::new(5, 0));
        assert_eq!(default_category_id(), 1086);
        assert_eq!(default_poll_interval(), 3);
        assert!(default_true());
    }

    #[test]
    fn validate_rejects_empty_marketplace_token() {
        let config = Config {
            funpay_auth_token: "".to_string(),
            ..test_config()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_topup_credentials() {
        let config = Config {
            steam_api_pass: "".to_string(),
            ..test_config()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let config = Config {
            poll_interval_secs: 0,
            ..test_config()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(test_config().validate().is_ok());
    }
}
