//! Aerostart-RS: suggestion retrieval and settings core for the Aerostart
//! browser start page
//!
//! The start page queries heterogeneous suggestion engines, most of them
//! cross-origin. This crate carries the engine catalog and per-engine
//! response normalization, the script-callback transport, the first-party
//! relay service for engines that refuse direct queries, and the debounced
//! settings store. Rendering lives elsewhere.

pub mod cache;
pub mod config;
pub mod engines;
pub mod network;
pub mod relay;
pub mod storage;
pub mod suggest;

pub use config::Settings;
pub use engines::{EngineConfig, EngineRegistry, SearchEngine, Transport};
pub use storage::{SettingsStore, UserSettings};
pub use suggest::{SuggestClient, SuggestError, SuggestionResult, TransportManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for suggestion queries in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
