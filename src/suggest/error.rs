//! Suggestion failure taxonomy

use crate::engines::{ConfigError, ParseError};
use std::time::Duration;
use thiserror::Error;

use super::script::LoadError;

/// Why a suggestion query failed
///
/// Every variant is a distinct terminal state the caller can branch on.
/// The rendering layer conventionally shows parse failures as an empty
/// suggestion list; configuration faults are programming or deployment
/// errors and should be surfaced.
#[derive(Debug, Error)]
pub enum SuggestError {
    /// Engine configuration fault: unregistered engine or a URL build that
    /// does not match the declared transport
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The script failed to load
    #[error("suggestion transport failed: {0}")]
    Transport(#[from] LoadError),
    /// No callback fired within the allotted time
    #[error("no suggestion callback within {0:?}")]
    Timeout(Duration),
    /// A payload arrived but did not match the engine's documented shape
    #[error(transparent)]
    Parse(#[from] ParseError),
}
