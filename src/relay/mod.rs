//! First-party relay module
//!
//! HTTP forwarding endpoint for suggestion engines the browser cannot query
//! directly. The page fetches `/api/{engine}?term=...` same-origin; the
//! relay talks to the upstream with the identification headers it requires
//! and hands the body back verbatim.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::RelayState;
