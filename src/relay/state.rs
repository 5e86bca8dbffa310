//! Relay state shared across handlers

use crate::cache::SuggestionCache;
use crate::config::{RelaySettings, RelayUpstream};
use crate::engines::SearchEngine;
use crate::network::HttpClient;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared relay state
#[derive(Clone)]
pub struct RelayState {
    /// Outgoing HTTP client
    pub client: HttpClient,
    /// Response cache for upstream bodies
    pub cache: Arc<SuggestionCache>,
    /// Cache-Control value advertised to CDNs
    pub cache_control: String,
    /// Upstream contracts by engine
    upstreams: Arc<HashMap<SearchEngine, RelayUpstream>>,
}

impl RelayState {
    /// Create relay state from settings
    pub fn new(client: HttpClient, settings: &RelaySettings) -> Self {
        let upstreams = settings
            .upstreams
            .iter()
            .map(|upstream| (upstream.engine, upstream.clone()))
            .collect();

        Self {
            client,
            cache: Arc::new(SuggestionCache::new(settings.cache_ttl_secs)),
            cache_control: format!(
                "s-maxage={}, stale-while-revalidate",
                settings.cache_ttl_secs
            ),
            upstreams: Arc::new(upstreams),
        }
    }

    /// Upstream contract for `engine`, if this relay serves it
    pub fn upstream(&self, engine: SearchEngine) -> Option<&RelayUpstream> {
        self.upstreams.get(&engine)
    }
}
