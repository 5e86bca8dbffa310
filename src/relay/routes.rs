//! Relay route definitions

use super::handlers;
use super::state::RelayState;
use axum::{routing::get, Router};

/// Create the relay router with all routes
///
/// Suggestion routes are GET-only; axum answers every other method with 405,
/// preflight included. The cross-origin headers the page needs are part of
/// each suggestion response, so no middleware sits in front of the handlers.
pub fn create_router(state: RelayState) -> Router {
    Router::new()
        // Relay routes
        .route("/api/:engine", get(handlers::relay_suggest))
        // API routes
        .route("/health", get(handlers::health))
        // Add state
        .with_state(state)
}
