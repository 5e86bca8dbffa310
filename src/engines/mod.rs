//! Suggestion engine module
//!
//! Defines the engine catalog with its transport contracts, the validated
//! registry, and per-engine response normalization.

mod catalog;
mod parser;
mod registry;

pub use catalog::{
    builtin_engines, ConfigError, EngineConfig, SearchEngine, Transport, CALLBACK_PLACEHOLDER,
    QUERY_PLACEHOLDER,
};
pub use parser::{parse_suggestions, ParseError};
pub use registry::EngineRegistry;
