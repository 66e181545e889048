//! Order reconciliation: validation, buyer dialog, execution.

pub mod executor;
pub mod handler;
pub mod parser;
pub mod session;

pub use executor::{should_deactivate, ExecutorStats, TopupExecutor, TopupOutcome};
pub use handler::{handle_new_message, handle_new_order};
pub use parser::{validate_order, TopupRequest};
pub use session::{BuyerSession, SessionStep, SessionStore};
