//! HTTP API handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

use crate::orders::ExecutorStats;

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Whether the bot has completed its first successful poll.
    pub ready: Arc<std::sync::atomic::AtomicBool>,
    /// Last known top-up service balance.
    pub service_balance: Arc<tokio::sync::RwLock<Option<Decimal>>>,
    /// Executor stats.
    pub stats: Arc<tokio::sync::RwLock<ExecutorStats>>,
}

impl AppState {
    /// Create new app state.
    pub fn new() -> Self {
        Self {
            ready: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            service_balance: Arc::new(tokio::sync::RwLock::new(None)),
            stats: Arc::new(tokio::sync::RwLock::new(ExecutorStats {
                orders_processed: 0,
                topups_completed: 0,
                topups_failed: 0,
                refunds_issued: 0,
                listings_deactivated: 0,
                total_usd_delivered: Decimal::ZERO,
            })),
        }
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready
            .store(ready, std::sync::atomic::Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether service is ready.
    pub ready: bool,
    /// Last known service balance if available.
    pub service_balance: Option<String>,
}

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Service status.
    pub status: &'static str,
    /// Last known service balance.
    pub service_balance: Option<String>,
    /// Statistics.
    pub stats: StatsResponse,
}

/// Statistics in status response.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Orders processed.
    pub orders_processed: u64,
    /// Top-ups completed.
    pub topups_completed: u64,
    /// Top-ups failed.
    pub topups_failed: u64,
    /// Refunds issued.
    pub refunds_issued: u64,
    /// Listings deactivated by the balance guard.
    pub listings_deactivated: u64,
    /// Total USD delivered.
    pub total_usd_delivered: String,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 if ready, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let balance = state
        .service_balance
        .read()
        .await
        .as_ref()
        .map(|b| b.to_string());

    let response = ReadyResponse {
        ready: is_ready,
        service_balance: balance,
    };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Status handler - returns bot status and statistics.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let balance = state
        .service_balance
        .read()
        .await
        .as_ref()
        .map(|b| b.to_string());
    let stats = state.stats.read().await;

    let status = if state.is_ready() { "running" } else { "starting" };

    Json(StatusResponse {
        status,
        service_balance: balance,
        stats: StatsResponse {
            orders_processed: stats.orders_processed,
            topups_completed: stats.topups_completed,
            topups_failed: stats.topups_failed,
            refunds_issued: stats.refunds_issued,
            listings_deactivated: stats.listings_deactivated,
            total_usd_delivered: stats.total_usd_delivered.to_string(),
        },
    })
}
