//! Suggestion query and result models

use crate::engines::SearchEngine;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// One in-flight suggestion request
///
/// Created per keystroke-driven query and discarded once a result or a
/// terminal failure is delivered.
#[derive(Debug, Clone)]
pub struct SuggestionQuery {
    /// Engine being queried
    pub engine: SearchEngine,
    /// Term as typed, before any encoding
    pub term: String,
    /// When the query was issued
    pub issued_at: Instant,
}

impl SuggestionQuery {
    /// Create a new query for `term`
    pub fn new(engine: SearchEngine, term: impl Into<String>) -> Self {
        Self {
            engine,
            term: term.into(),
            issued_at: Instant::now(),
        }
    }

    /// Milliseconds elapsed since the query was issued
    pub fn elapsed_ms(&self) -> u64 {
        self.issued_at.elapsed().as_millis() as u64
    }
}

/// Ordered suggestions delivered for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionResult {
    /// Engine that produced the suggestions
    pub engine: SearchEngine,
    /// Echo of the queried term
    pub term: String,
    /// Suggestions in engine-relevance order, never with null entries
    pub suggestions: Vec<String>,
}

impl SuggestionResult {
    /// Create a result for `term`
    pub fn new(engine: SearchEngine, term: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            engine,
            term: term.into(),
            suggestions,
        }
    }

    /// Check if the engine produced no suggestions
    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_serializes_engine_identifier() {
        let result = SuggestionResult::new(SearchEngine::DuckDuckGo, "cat", vec![]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["engine"], "duckduckgo");
        assert_eq!(json["term"], "cat");
    }
}
