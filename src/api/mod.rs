//! HTTP API for health and status.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::{create_router, health_router};
