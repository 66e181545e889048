//! Prometheus metrics for the top-up bot.
//!
//! Covers the reconciliation loop end to end:
//! - marketplace orders received
//! - top-ups completed / failed, refunds, listing deactivations
//! - latency of the service calls on the hot path

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

// === Metric Name Constants ===

/// Orders received counter metric name.
pub const METRIC_ORDERS_RECEIVED: &str = "orders_received_total";
/// Top-ups completed counter metric name.
pub const METRIC_TOPUPS_COMPLETED: &str = "topups_completed_total";
/// Top-ups failed counter metric name.
pub const METRIC_TOPUPS_FAILED: &str = "topups_failed_total";
/// Refunds issued counter metric name.
pub const METRIC_REFUNDS_ISSUED: &str = "refunds_issued_total";
/// Listings deactivated counter metric name.
pub const METRIC_LISTINGS_DEACTIVATED: &str = "listings_deactivated_total";
/// Marketplace polls counter metric name.
pub const METRIC_POLLS: &str = "marketplace_polls_total";
/// Login check latency metric name.
pub const METRIC_LOGIN_CHECK_LATENCY: &str = "login_check_latency_ms";
/// Top-up (pay) latency metric name.
pub const METRIC_TOPUP_LATENCY: &str = "topup_latency_ms";
/// Balance check latency metric name.
pub const METRIC_BALANCE_CHECK_LATENCY: &str = "balance_check_latency_ms";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_counter!(METRIC_ORDERS_RECEIVED, "Total marketplace orders received");
    describe_counter!(METRIC_TOPUPS_COMPLETED, "Total top-ups completed");
    describe_counter!(METRIC_TOPUPS_FAILED, "Total top-ups that failed");
    describe_counter!(METRIC_REFUNDS_ISSUED, "Total refunds issued to buyers");
    describe_counter!(
        METRIC_LISTINGS_DEACTIVATED,
        "Total listings deactivated by the balance guard"
    );
    describe_counter!(METRIC_POLLS, "Total marketplace event polls");

    describe_histogram!(
        METRIC_LOGIN_CHECK_LATENCY,
        "Login eligibility check latency in milliseconds"
    );
    describe_histogram!(METRIC_TOPUP_LATENCY, "Top-up payment latency in milliseconds");
    describe_histogram!(
        METRIC_BALANCE_CHECK_LATENCY,
        "Service balance check latency in milliseconds"
    );

    debug!("Metrics initialized");
}

/// Increment orders received counter.
pub fn inc_orders_received() {
    counter!(METRIC_ORDERS_RECEIVED).increment(1);
}

/// Increment top-ups completed counter.
pub fn inc_topups_completed() {
    counter!(METRIC_TOPUPS_COMPLETED).increment(1);
}

/// Increment top-ups failed counter.
pub fn inc_topups_failed() {
    counter!(METRIC_TOPUPS_FAILED).increment(1);
}

/// Increment refunds issued counter.
pub fn inc_refunds_issued() {
    counter!(METRIC_REFUNDS_ISSUED).increment(1);
}

/// Increment listings deactivated counter.
pub fn inc_listings_deactivated() {
    counter!(METRIC_LISTINGS_DEACTIVATED).increment(1);
}

/// Increment marketplace poll counter.
pub fn inc_polls() {
    counter!(METRIC_POLLS).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name).record(latency_ms);
    }
}

/// Create a latency timer for login checks.
pub fn timer_login_check() -> LatencyTimer {
    LatencyTimer::new(METRIC_LOGIN_CHECK_LATENCY)
}

/// Create a latency timer for top-up payments.
pub fn timer_topup() -> LatencyTimer {
    LatencyTimer::new(METRIC_TOPUP_LATENCY)
}

/// Create a latency timer for balance checks.
pub fn timer_balance_check() -> LatencyTimer {
    LatencyTimer::new(METRIC_BALANCE_CHECK_LATENCY)
}
