//! Settings persistence module
//!
//! The preference model and the debounced, quota-aware store that persists
//! it as a single blob.

mod settings;
mod store;

pub use settings::{ClockSettings, UserSettings};
pub use store::{
    SettingsError, SettingsStore, DEFAULT_DEBOUNCE, DEFAULT_QUOTA_BYTES, STORAGE_KEY,
};
