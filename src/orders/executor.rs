//! Top-up execution and failure reconciliation.
//!
//! One validated request flows through: create the service order, pay it,
//! and on failure run the balance guard: deactivate the category when the
//! service balance is below the configured minimum, then refund the buyer.

use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};

use crate::config::Config;
use crate::error::{BotError, TopupError};
use crate::funpay::Marketplace;
use crate::metrics;
use crate::steam::TopupService;

use super::session::BuyerSession;

/// Result of attempting a top-up.
#[derive(Debug)]
pub enum TopupOutcome {
    /// Service order created and paid.
    Completed {
        /// Correlation id of the service order.
        custom_id: String,
        /// Login that was credited.
        login: String,
        /// USD amount delivered.
        usd_amount: Decimal,
    },
    /// Top-up failed; reconciliation ran.
    Failed {
        /// Buyer-facing explanation.
        buyer_message: &'static str,
        /// Whether the marketplace order was refunded.
        refunded: bool,
        /// Listings deactivated by the balance guard.
        listings_deactivated: u64,
    },
    /// Simulation mode - no service calls were made.
    Simulated {
        /// Login that would be credited.
        login: String,
        /// USD amount that would be delivered.
        usd_amount: Decimal,
    },
}

/// Decide whether the balance guard should fire.
pub fn should_deactivate(balance: Decimal, min_balance: Decimal, auto_deactivate: bool) -> bool {
    auto_deactivate && balance < min_balance
}

/// Executor state for tracking reconciliation stats.
#[derive(Debug)]
pub struct TopupExecutor {
    /// Balance threshold for the listing guard.
    min_balance: Decimal,
    /// Refund automatically on failure.
    auto_refund: bool,
    /// Deactivate listings automatically on low balance.
    auto_deactivate: bool,
    /// Category the guard deactivates.
    category_id: u64,
    /// Simulation mode.
    dry_run: bool,
    /// Orders that reached execution.
    pub orders_processed: u64,
    /// Top-ups completed.
    pub topups_completed: u64,
    /// Top-ups failed.
    pub topups_failed: u64,
    /// Refunds issued.
    pub refunds_issued: u64,
    /// Listings deactivated by the guard.
    pub listings_deactivated: u64,
    /// Total USD delivered to buyers.
    pub total_usd_delivered: Decimal,
}

impl TopupExecutor {
    /// Create a new executor from config.
    pub fn new(config: &Config) -> Self {
        Self {
            min_balance: config.min_balance,
            auto_refund: config.auto_refund,
            auto_deactivate: config.auto_deactivate,
            category_id: config.category_id,
            dry_run: config.dry_run,
            orders_processed: 0,
            topups_completed: 0,
            topups_failed: 0,
            refunds_issued: 0,
            listings_deactivated: 0,
            total_usd_delivered: Decimal::ZERO,
        }
    }

    /// Execute a confirmed top-up for a buyer session.
    #[instrument(skip(self, steam, funpay, session), fields(order_id = %session.order_id, login = %login))]
    pub async fn execute<S: TopupService, M: Marketplace>(
        &mut self,
        steam: &S,
        funpay: &M,
        session: &BuyerSession,
        login: &str,
    ) -> Result<TopupOutcome, BotError> {
        self.orders_processed += 1;

        if self.dry_run {
            info!(
                usd = %session.usd_amount,
                "SIMULATION MODE - no top-up will be performed"
            );
            self.topups_completed += 1;
            self.total_usd_delivered += session.usd_amount;
            return Ok(TopupOutcome::Simulated {
                login: login.to_string(),
                usd_amount: session.usd_amount,
            });
        }

        let custom_id = match steam.create_order(login, session.usd_amount).await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "Top-up order creation failed");
                return Ok(self.reconcile_failure(steam, funpay, session, &e).await);
            }
        };

        if let Err(e) = steam.pay_order(&custom_id).await {
            error!(custom_id = %custom_id, error = %e, "Top-up payment failed");
            return Ok(self.reconcile_failure(steam, funpay, session, &e).await);
        }

        self.topups_completed += 1;
        self.total_usd_delivered += session.usd_amount;
        metrics::inc_topups_completed();

        info!(
            custom_id = %custom_id,
            usd = %session.usd_amount,
            "TOP-UP COMPLETED"
        );

        Ok(TopupOutcome::Completed {
            custom_id,
            login: login.to_string(),
            usd_amount: session.usd_amount,
        })
    }

    /// Run the failure path: balance guard, then optional refund.
    async fn reconcile_failure<S: TopupService, M: Marketplace>(
        &mut self,
        steam: &S,
        funpay: &M,
        session: &BuyerSession,
        failure: &TopupError,
    ) -> TopupOutcome {
        self.topups_failed += 1;
        metrics::inc_topups_failed();

        let deactivated = self.enforce_balance_guard(steam, funpay).await;

        let mut refunded = false;
        if self.auto_refund {
            match funpay.refund(&session.order_id).await {
                Ok(()) => {
                    refunded = true;
                    self.refunds_issued += 1;
                }
                Err(e) => {
                    error!(order_id = %session.order_id, error = %e, "Refund failed");
                }
            }
        }

        TopupOutcome::Failed {
            buyer_message: failure.buyer_message(),
            refunded,
            listings_deactivated: deactivated,
        }
    }

    /// Check the service balance and deactivate the category when it is
    /// below the minimum. Returns how many listings were deactivated.
    async fn enforce_balance_guard<S: TopupService, M: Marketplace>(
        &mut self,
        steam: &S,
        funpay: &M,
    ) -> u64 {
        let balance = match steam.check_balance().await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "Balance check failed, skipping listing guard");
                return 0;
            }
        };

        if !should_deactivate(balance, self.min_balance, self.auto_deactivate) {
            return 0;
        }

        warn!(
            balance = %balance,
            min_balance = %self.min_balance,
            "Balance below threshold, deactivating category listings"
        );

        match funpay.deactivate_category(self.category_id).await {
            Ok(count) => {
                self.listings_deactivated += count;
                count
            }
            Err(e) => {
                error!(error = %e, "Failed to deactivate listings");
                0
            }
        }
    }

    /// Get statistics summary.
    pub fn stats(&self) -> ExecutorStats {
        ExecutorStats {
            orders_processed: self.orders_processed,
            topups_completed: self.topups_completed,
            topups_failed: self.topups_failed,
            refunds_issued: self.refunds_issued,
            listings_deactivated: self.listings_deactivated,
            total_usd_delivered: self.total_usd_delivered,
        }
    }
}

/// Executor statistics.
#[derive(Debug, Clone)]
pub struct ExecutorStats {
    /// Orders that reached execution.
    pub orders_processed: u64,
    /// Top-ups completed.
    pub topups_completed: u64,
    /// Top-ups failed.
    pub topups_failed: u64,
    /// Refunds issued.
    pub refunds_issued: u64,
    /// Listings deactivated by the guard.
    pub listings_deactivated: u64,
    /// Total USD delivered.
    pub total_usd_delivered: Decimal,
}

impl ExecutorStats {
    /// Fraction of processed orders that completed, as a percentage.
    pub fn success_rate_pct(&self) -> Decimal {
        if self.orders_processed == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.topups_completed) * Decimal::ONE_HUNDRED
            / Decimal::from(self.orders_processed)
    }
}
