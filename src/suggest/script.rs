//! Script loading, the injected-element half of the transport
//!
//! In a browser the transport injects a script element and lets the response
//! body execute. Here the element is a fetch of the script text plus
//! extraction of the callback invocation the body carries. `ScriptLoader` is
//! the seam between the two halves: production loads over HTTP, tests script
//! their own loaders.

use crate::network::HttpClient;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Why a script element failed to load
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// Network-level failure: DNS, connect, TLS, or body read
    #[error("network error: {0}")]
    Network(String),
    /// Upstream answered with a non-success status
    #[error("upstream status {0}")]
    Status(u16),
    /// The pending query was discarded before the script completed
    #[error("script discarded before completion")]
    Discarded,
}

/// Fetches the script body a suggestion URL points at
#[async_trait]
pub trait ScriptLoader: Send + Sync {
    /// Load the script at `url`, returning its text body
    async fn load(&self, url: &str) -> Result<String, LoadError>;
}

/// Production loader backed by the shared HTTP client
pub struct HttpScriptLoader {
    client: HttpClient,
}

impl HttpScriptLoader {
    /// Create a loader on `client`
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScriptLoader for HttpScriptLoader {
    async fn load(&self, url: &str) -> Result<String, LoadError> {
        let response = self
            .client
            .get(url)
            .await
            .map_err(|e| LoadError::Network(e.to_string()))?;
        if !response.is_success() {
            return Err(LoadError::Status(response.status));
        }
        Ok(response.text)
    }
}

/// Extract the JSON argument of the `callback(...)` invocation in `body`
///
/// Mirrors in-browser execution: only an invocation of the named callback
/// counts, and a body that never invokes it yields nothing (the owning query
/// then runs into its timeout). Trailing statements after the invocation are
/// ignored.
pub(crate) fn extract_payload(body: &str, callback: &str) -> Option<Value> {
    let mut search = 0;
    while let Some(found) = body[search..].find(callback) {
        let after = search + found + callback.len();
        let rest = &body[after..];
        if let Some(open) = rest.find('(') {
            if rest[..open].trim().is_empty() {
                // Parse exactly one JSON value; whatever follows it (the
                // closing paren, semicolons, further statements) is not ours.
                let args = &rest[open + 1..];
                let mut stream = serde_json::Deserializer::from_str(args).into_iter::<Value>();
                if let Some(Ok(payload)) = stream.next() {
                    return Some(payload);
                }
            }
        }
        search = after;
    }
    None
}
