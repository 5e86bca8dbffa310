//! Relay request handlers

use super::state::RelayState;
use crate::cache::suggestion_cache_key;
use crate::config::RelayUpstream;
use crate::engines::SearchEngine;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

/// Query parameters for a relayed suggestion request
#[derive(Debug, Deserialize)]
pub struct RelayParams {
    /// Search term
    pub term: Option<String>,
}

/// Relay handler: `GET /api/{engine}?term=...`
///
/// Forwards the term to the engine's upstream and returns the body verbatim.
/// Upstream failures never surface to the caller; they are logged and masked
/// with a payload the engine's parser normalizes to an empty suggestion list.
pub async fn relay_suggest(
    State(state): State<RelayState>,
    Path(engine): Path<String>,
    Query(params): Query<RelayParams>,
) -> Response {
    // Resolve the engine; only relayed engines have an upstream here.
    let engine = match SearchEngine::parse(&engine) {
        Some(engine) => engine,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "Unknown engine" })),
            )
                .into_response()
        }
    };
    let upstream = match state.upstream(engine) {
        Some(upstream) => upstream.clone(),
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "Engine is not relayed" })),
            )
                .into_response()
        }
    };

    // Check for term
    let term = match params.term {
        Some(term) if !term.is_empty() => term,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "Missing term parameter" })),
            )
                .into_response()
        }
    };

    match fetch_upstream(&state, engine, &upstream, &term).await {
        Ok(body) => suggestion_response(&state, body),
        Err(e) => {
            tracing::error!(engine = %engine, error = %e, "relay upstream failure");
            suggestion_response(&state, masked_failure().to_string())
        }
    }
}

/// Fetch the upstream body for `term`, through the response cache
async fn fetch_upstream(
    state: &RelayState,
    engine: SearchEngine,
    upstream: &RelayUpstream,
    term: &str,
) -> anyhow::Result<String> {
    let key = suggestion_cache_key(engine.as_str(), term);
    if let Some(cached) = state.cache.get(&key).await {
        tracing::debug!(engine = %engine, "relay cache hit");
        return Ok(cached);
    }

    let url = format!(
        "{}?{}={}",
        upstream.url,
        upstream.term_param,
        urlencoding::encode(term)
    );
    let response = state.client.get_with_headers(&url, &upstream.headers).await?;
    if !response.is_success() {
        return Err(anyhow::anyhow!("upstream returned {}", response.status));
    }

    // Only successful bodies are cached; failures stay fresh so recovery is
    // visible within the TTL.
    state.cache.set(key, response.text.clone()).await;
    Ok(response.text)
}

/// Masked payload for any upstream or internal failure
fn masked_failure() -> serde_json::Value {
    serde_json::json!({
        "error": "Failed to fetch suggestions",
        "code": -1,
        "result": { "tag": [] }
    })
}

/// 200 response carrying `body` with the relay's fixed headers
fn suggestion_response(state: &RelayState, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*".to_string()),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET".to_string()),
            (header::CACHE_CONTROL, state.cache_control.clone()),
        ],
        body,
    )
        .into_response()
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}
