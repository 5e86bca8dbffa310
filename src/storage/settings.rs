//! User preference model

use crate::engines::SearchEngine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User preferences persisted as a single blob
///
/// The core knows the fields it consumes; anything else the settings UI
/// defines rides in `extra` and survives a load/save round trip untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// UI theme identifier
    pub theme: String,
    /// Selected wallpaper: built-in identifier or upload key
    pub wallpaper: String,
    /// Engine the search box queries
    pub search_engine: SearchEngine,
    /// Clock display preferences
    pub clock: ClockSettings,
    /// UI language
    pub language: String,
    /// Preference fields owned by the UI layer, opaque here
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            wallpaper: "default".to_string(),
            search_engine: SearchEngine::Google,
            clock: ClockSettings::default(),
            language: "en".to_string(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Clock display preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    /// Show the seconds digits
    pub show_seconds: bool,
    /// 24-hour instead of 12-hour display
    pub use_24_hour_format: bool,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            show_seconds: true,
            use_24_hour_format: true,
        }
    }
}
