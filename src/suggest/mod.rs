//! Suggestion retrieval module
//!
//! Carries the script-callback transport with its callback namespace, the
//! failure taxonomy, and the facade that picks a transport per engine.

mod callbacks;
mod client;
mod error;
mod models;
mod script;
mod transport;

pub use callbacks::{callback_name, CallbackNamespace, ScriptOutcome};
pub use client::SuggestClient;
pub use error::SuggestError;
pub use models::{SuggestionQuery, SuggestionResult};
pub use script::{HttpScriptLoader, LoadError, ScriptLoader};
pub use transport::TransportManager;
