//! Marketplace event handlers: new orders and buyer messages.

use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::{OrderError, Result};
use crate::funpay::{ChatMessage, Marketplace, Order};
use crate::metrics;
use crate::orders::executor::{TopupExecutor, TopupOutcome};
use crate::orders::parser::validate_order;
use crate::orders::session::{BuyerSession, SessionStep, SessionStore};
use crate::steam::TopupService;

/// Replies that complete an order at the confirmation step.
const CONFIRM_WORDS: &[&str] = &[
    "confirm",
    "confirmed",
    "ok",
    "okay",
    "yes",
    "+",
    "подтверждаю",
    "да",
    "ок",
    "окей",
];

/// Refund an invalid order and tell the buyer why.
async fn refund_with_notice<M: Marketplace>(
    funpay: &M,
    chat_id: Option<u64>,
    order_id: &str,
    notice: &str,
    config: &Config,
) -> Result<()> {
    info!(order_id, notice, "Refunding invalid order");

    if let Some(chat_id) = chat_id {
        let text = format!("{}\n\nYour money will be refunded automatically.", notice);
        if let Err(e) = funpay.send_message(chat_id, &text).await {
            warn!(chat_id, error = %e, "Failed to notify buyer");
        }
    }

    if config.auto_refund && !config.dry_run {
        funpay.refund(order_id).await?;
    }

    Ok(())
}

/// Handle a new marketplace order: validate it, convert the amount to USD
/// and open a dialog session asking the buyer for their Steam login.
#[instrument(skip_all, fields(order_id = %order.id, buyer_id = order.buyer_id))]
pub async fn handle_new_order<S: TopupService, M: Marketplace>(
    funpay: &M,
    steam: &S,
    sessions: &SessionStore,
    order: &Order,
    config: &Config,
) -> Result<()> {
    metrics::inc_orders_received();

    let request = match validate_order(order, config.category_id) {
        Ok(request) => request,
        Err(OrderError::WrongCategory { got, expected }) => {
            info!(?got, expected, "Order ignored: different subcategory");
            return Ok(());
        }
        Err(e @ OrderError::MissingCurrency) | Err(e @ OrderError::UnsupportedCurrency(_)) => {
            return refund_with_notice(
                funpay,
                order.chat_id,
                &order.id,
                &format!(
                    "The order is missing a valid wallet currency (expected `steam_wallet: rub|uah|kzt|usd`): {}",
                    e
                ),
                config,
            )
            .await;
        }
        Err(e @ OrderError::AmountNotFound) => {
            return refund_with_notice(
                funpay,
                order.chat_id,
                &order.id,
                &format!("The top-up amount could not be determined: {}", e),
                config,
            )
            .await;
        }
        Err(e @ OrderError::BelowMinimum { .. }) => {
            return refund_with_notice(
                funpay,
                order.chat_id,
                &order.id,
                &format!("The order is below the service minimum: {}", e),
                config,
            )
            .await;
        }
    };

    info!(
        amount = %request.amount,
        currency = %request.currency,
        "New top-up order accepted"
    );

    let usd_amount = match steam.convert_to_usd(request.currency, request.amount).await {
        Ok(usd) => usd,
        Err(e) => {
            warn!(error = %e, "Currency conversion failed");
            return refund_with_notice(
                funpay,
                request.chat_id,
                &request.order_id,
                "The currency conversion failed. Please try ordering again later.",
                config,
            )
            .await;
        }
    };

    let Some(chat_id) = request.chat_id else {
        warn!("Order has no open chat, refunding");
        return refund_with_notice(
            funpay,
            None,
            &request.order_id,
            "no chat available",
            config,
        )
        .await;
    };

    sessions.open(
        request.buyer_id,
        BuyerSession {
            order_id: request.order_id.clone(),
            chat_id,
            amount: request.amount,
            currency: request.currency,
            usd_amount,
            step: SessionStep::AwaitingLogin,
        },
    );

    funpay
        .send_message(
            chat_id,
            &format!(
                "Thanks for your order!\n\n\
                 Top-up amount: {} {} (~{:.2} USD).\n\
                 Please send your Steam login (not your email or phone number).",
                request.amount, request.currency, usd_amount
            ),
        )
        .await?;

    info!("Waiting for buyer login");
    Ok(())
}

/// Handle a buyer chat message according to the session step.
#[instrument(skip_all, fields(buyer_id = message.author_id, chat_id = message.chat_id))]
pub async fn handle_new_message<S: TopupService, M: Marketplace>(
    funpay: &M,
    steam: &S,
    sessions: &SessionStore,
    executor: &mut TopupExecutor,
    message: &ChatMessage,
    config: &Config,
) -> Result<()> {
    let Some(session) = sessions.get(message.author_id) else {
        return Ok(());
    };

    let text = message.text.trim();

    match session.step {
        SessionStep::AwaitingLogin => {
            handle_login_attempt(funpay, steam, sessions, &session, message.author_id, text).await
        }
        SessionStep::ConfirmingLogin { ref login } => {
            if text == "+" {
                run_topup(funpay, steam, sessions, executor, &session, message.author_id, login)
                    .await
            } else {
                // A different login instead of confirmation
                handle_login_attempt(funpay, steam, sessions, &session, message.author_id, text)
                    .await
            }
        }
        SessionStep::AwaitingTopupConfirm { .. } => {
            handle_topup_confirmation(funpay, sessions, &session, message.author_id, text, config)
                .await
        }
    }
}

/// Validate a login the buyer sent and ask for confirmation.
async fn handle_login_attempt<S: TopupService, M: Marketplace>(
    funpay: &M,
    steam: &S,
    sessions: &SessionStore,
    session: &BuyerSession,
    buyer_id: u64,
    login: &str,
) -> Result<()> {
    let eligible = match steam.check_login(login).await {
        Ok(ok) => ok,
        Err(e) => {
            warn!(error = %e, "Login check errored");
            funpay
                .send_message(
                    session.chat_id,
                    "The login could not be verified right now. Please send it again in a moment.",
                )
                .await?;
            return Ok(());
        }
    };

    if !eligible {
        info!(login, "Login not found");
        funpay
            .send_message(
                session.chat_id,
                &format!(
                    "Login `{}` was not found. Check the spelling and send it again.\n\n\
                     Example: `gabelogannewell`",
                    login
                ),
            )
            .await?;
        return Ok(());
    }

    sessions.advance(
        buyer_id,
        SessionStep::ConfirmingLogin {
            login: login.to_string(),
        },
    );

    funpay
        .send_message(
            session.chat_id,
            &format!(
                "Login found!\n\n\
                 You entered: `{}`\n\
                 Amount: {} {} (~{:.2} USD)\n\n\
                 Reply `+` if everything is correct, or send a different login.",
                login, session.amount, session.currency, session.usd_amount
            ),
        )
        .await?;

    info!(login, "Login validated, awaiting confirmation");
    Ok(())
}

/// Execute the top-up for a confirmed login and report to the buyer.
async fn run_topup<S: TopupService, M: Marketplace>(
    funpay: &M,
    steam: &S,
    sessions: &SessionStore,
    executor: &mut TopupExecutor,
    session: &BuyerSession,
    buyer_id: u64,
    login: &str,
) -> Result<()> {
    info!(usd = %session.usd_amount, "Buyer confirmed, executing top-up");

    match executor.execute(steam, funpay, session, login).await? {
        TopupOutcome::Completed { .. } | TopupOutcome::Simulated { .. } => {
            sessions.advance(
                buyer_id,
                SessionStep::AwaitingTopupConfirm {
                    login: login.to_string(),
                },
            );

            funpay
                .send_message(
                    session.chat_id,
                    &format!(
                        "Done!\n\n\
                         We credited `{}` with {} {} (~{:.2} USD).\n\n\
                         Please check your Steam balance. If everything arrived, \
                         reply `confirm` and we will close the order. \
                         If something is wrong, describe the problem here.",
                        login, session.amount, session.currency, session.usd_amount
                    ),
                )
                .await?;
        }
        TopupOutcome::Failed {
            buyer_message,
            refunded,
            listings_deactivated,
        } => {
            warn!(refunded, listings_deactivated, "Top-up failed");

            funpay
                .send_message(session.chat_id, &format!("Sorry, {}", buyer_message))
                .await?;

            sessions.close(buyer_id);
        }
    }

    Ok(())
}

/// Close the marketplace order once the buyer confirms the credit arrived.
async fn handle_topup_confirmation<M: Marketplace>(
    funpay: &M,
    sessions: &SessionStore,
    session: &BuyerSession,
    buyer_id: u64,
    text: &str,
    config: &Config,
) -> Result<()> {
    let normalized = text.to_lowercase();
    let confirmed = CONFIRM_WORDS.contains(&normalized.trim_end_matches('.'));

    if !confirmed {
        funpay
            .send_message(
                session.chat_id,
                "If everything arrived, reply `confirm` to close the order. \
                 If something is wrong, describe the problem here.",
            )
            .await?;
        return Ok(());
    }

    if config.dry_run {
        info!("SIMULATION MODE - order completion skipped");
    } else if let Err(e) = funpay.complete_order(&session.order_id).await {
        warn!(order_id = %session.order_id, error = %e, "Order completion failed");
        funpay
            .send_message(
                session.chat_id,
                "Your confirmation is recorded, but closing the order hit a \
                 temporary issue. The status will update automatically shortly.",
            )
            .await?;
        sessions.close(buyer_id);
        return Ok(());
    }

    funpay
        .send_message(
            session.chat_id,
            "Thank you! The order is confirmed and closed. See you next time!",
        )
        .await?;

    info!(order_id = %session.order_id, "Order confirmed by buyer and closed");
    sessions.close(buyer_id);
    Ok(())
}
