//! Per-engine response normalization
//!
//! Every engine wraps its suggestions in a different JSON shape. The
//! normalizer dispatches on engine identity and produces a flat, ordered
//! list of suggestion strings. Documented failure shapes of an engine
//! (Bilibili's non-zero `code` envelope, including the relay's masked
//! failure payload) normalize to an empty list; structurally alien payloads
//! are an error.

use super::catalog::SearchEngine;
use serde_json::Value;
use thiserror::Error;

/// A payload that does not match its engine's documented shape
#[derive(Debug, Error)]
#[error("{engine} suggestion payload is not {expected}")]
pub struct ParseError {
    /// Engine whose parser rejected the payload
    pub engine: SearchEngine,
    /// Shape the parser was looking for
    pub expected: &'static str,
}

impl ParseError {
    pub(crate) fn new(engine: SearchEngine, expected: &'static str) -> Self {
        Self { engine, expected }
    }
}

/// Normalize `payload` into plain suggestion strings, preserving order
///
/// Entries of an unexpected type inside an otherwise well-formed list are
/// skipped, so the result never contains empty placeholders for them.
pub fn parse_suggestions(engine: SearchEngine, payload: &Value) -> Result<Vec<String>, ParseError> {
    match engine {
        SearchEngine::Google => parse_google(payload),
        SearchEngine::Baidu => parse_baidu(payload),
        SearchEngine::Bing => parse_bing(payload),
        SearchEngine::DuckDuckGo => parse_duckduckgo(payload),
        SearchEngine::Bilibili => parse_bilibili(payload),
    }
}

// Google (client=youtube) returns: [query, [[suggestion, ...], ...], ...]
// with bare-string entries on some client variants.
fn parse_google(payload: &Value) -> Result<Vec<String>, ParseError> {
    let entries = payload.get(1).and_then(|v| v.as_array()).ok_or_else(|| {
        ParseError::new(SearchEngine::Google, "an array with suggestions at index 1")
    })?;
    Ok(entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(s) => Some(s.clone()),
            Value::Array(inner) => inner.first().and_then(|v| v.as_str()).map(String::from),
            _ => None,
        })
        .collect())
}

// Baidu returns: {"q": query, "p": bool, "s": [suggestion, ...]}
fn parse_baidu(payload: &Value) -> Result<Vec<String>, ParseError> {
    let entries = payload.get("s").and_then(|v| v.as_array()).ok_or_else(|| {
        ParseError::new(SearchEngine::Baidu, "an object with an `s` suggestion array")
    })?;
    Ok(entries
        .iter()
        .filter_map(|v| v.as_str().map(String::from))
        .collect())
}

// Bing (osjson) returns: [query, [suggestion, ...]]
fn parse_bing(payload: &Value) -> Result<Vec<String>, ParseError> {
    let entries = payload.get(1).and_then(|v| v.as_array()).ok_or_else(|| {
        ParseError::new(SearchEngine::Bing, "an array with suggestions at index 1")
    })?;
    Ok(entries
        .iter()
        .filter_map(|v| v.as_str().map(String::from))
        .collect())
}

// DuckDuckGo (type=list) returns: [{"phrase": suggestion}, ...]
fn parse_duckduckgo(payload: &Value) -> Result<Vec<String>, ParseError> {
    let entries = payload.as_array().ok_or_else(|| {
        ParseError::new(SearchEngine::DuckDuckGo, "an array of `phrase` objects")
    })?;
    Ok(entries
        .iter()
        .filter_map(|item| item.get("phrase").and_then(|v| v.as_str()).map(String::from))
        .collect())
}

// Bilibili returns: {"code": 0, "result": {"tag": [{"value": suggestion}, ...]}}
// Any non-zero code is a documented failure envelope and yields no
// suggestions; a zero code with the tag list missing does the same.
fn parse_bilibili(payload: &Value) -> Result<Vec<String>, ParseError> {
    let code = payload.get("code").and_then(|v| v.as_i64()).ok_or_else(|| {
        ParseError::new(SearchEngine::Bilibili, "an object with a numeric `code`")
    })?;
    if code != 0 {
        return Ok(Vec::new());
    }
    Ok(payload
        .pointer("/result/tag")
        .and_then(|v| v.as_array())
        .map(|tags| {
            tags.iter()
                .filter_map(|tag| tag.get("value").and_then(|v| v.as_str()).map(String::from))
                .collect()
        })
        .unwrap_or_default())
}
