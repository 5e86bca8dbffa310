//! Suggestion facade for the rendering layer

use super::error::SuggestError;
use super::models::SuggestionResult;
use super::script::{HttpScriptLoader, LoadError};
use super::transport::TransportManager;
use crate::config::SuggestSettings;
use crate::engines::{
    parse_suggestions, ConfigError, EngineRegistry, ParseError, SearchEngine, Transport,
};
use crate::network::HttpClient;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Single entry point callers hand an `(engine, term)` pair to
///
/// Dispatches on the engine's declared transport: script-callback engines go
/// through the `TransportManager`, relayed engines are fetched from the
/// first-party relay and normalized with the same per-engine parser.
pub struct SuggestClient {
    registry: Arc<EngineRegistry>,
    transport: TransportManager,
    http: HttpClient,
    relay_base: String,
    timeout: Duration,
}

impl SuggestClient {
    /// Create a client over `registry`
    pub fn new(registry: Arc<EngineRegistry>, client: HttpClient, settings: &SuggestSettings) -> Self {
        let loader = Arc::new(HttpScriptLoader::new(client.clone()));
        Self {
            transport: TransportManager::new(Arc::clone(&registry), loader),
            registry,
            http: client,
            relay_base: settings.relay_base.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(settings.timeout_ms),
        }
    }

    /// Fetch suggestions for `term` from `engine`
    pub async fn suggest(
        &self,
        engine: SearchEngine,
        term: &str,
    ) -> Result<SuggestionResult, SuggestError> {
        let config = self
            .registry
            .get(engine)
            .ok_or(ConfigError::NotRegistered(engine))?;
        match config.transport {
            Transport::ScriptCallback => self.transport.query(engine, term, self.timeout).await,
            Transport::Relay => self.fetch_relay(engine, term).await,
        }
    }

    /// GET the relay endpoint for `engine` and normalize its JSON body
    async fn fetch_relay(
        &self,
        engine: SearchEngine,
        term: &str,
    ) -> Result<SuggestionResult, SuggestError> {
        let config = self
            .registry
            .get(engine)
            .ok_or(ConfigError::NotRegistered(engine))?;
        let url = format!("{}{}", self.relay_base, config.relay_url(term)?);
        debug!(engine = %engine, url = %url, "fetching relayed suggestions");

        let response = tokio::time::timeout(self.timeout, self.http.get(&url))
            .await
            .map_err(|_| SuggestError::Timeout(self.timeout))?
            .map_err(|e| LoadError::Network(e.to_string()))?;
        if !response.is_success() {
            return Err(SuggestError::Transport(LoadError::Status(response.status)));
        }

        let payload: Value = serde_json::from_str(&response.text)
            .map_err(|_| ParseError::new(engine, "a JSON body"))?;
        let suggestions = parse_suggestions(engine, &payload)?;
        Ok(SuggestionResult::new(engine, term, suggestions))
    }

    /// Engines available to the settings UI, in catalog order
    pub fn engines(&self) -> Vec<SearchEngine> {
        self.registry.engines()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::EngineConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    /// Responder that plays the part of a script-callback engine: it reads
    /// the callback name out of the request and invokes it around the
    /// configured payload.
    struct JsonpResponder {
        callback_param: &'static str,
        payload: &'static str,
    }

    impl Respond for JsonpResponder {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let callback = request
                .url
                .query_pairs()
                .find(|(k, _)| k == self.callback_param)
                .map(|(_, v)| v.to_string())
                .unwrap_or_default();
            ResponseTemplate::new(200)
                .set_body_string(format!("{}({});", callback, self.payload))
        }
    }

    fn client_for(registry: EngineRegistry, relay_base: String) -> SuggestClient {
        let settings = SuggestSettings {
            timeout_ms: 1000,
            relay_base,
        };
        SuggestClient::new(
            Arc::new(registry),
            HttpClient::new().unwrap(),
            &settings,
        )
    }

    #[tokio::test]
    async fn test_script_callback_engine_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/complete/search"))
            .and(query_param("q", "rust"))
            .respond_with(JsonpResponder {
                callback_param: "jsonp",
                payload: r#"["rust", [["rust lang", 0], ["rust book", 0]]]"#,
            })
            .mount(&server)
            .await;

        let mut registry = EngineRegistry::new();
        registry
            .register(EngineConfig::script(
                SearchEngine::Google,
                format!(
                    "{}/complete/search?client=youtube&q={{query}}&jsonp={{callback}}",
                    server.uri()
                ),
            ))
            .unwrap();

        let client = client_for(registry, String::new());
        let result = client.suggest(SearchEngine::Google, "rust").await.unwrap();
        assert_eq!(result.suggestions, vec!["rust lang", "rust book"]);
    }

    #[tokio::test]
    async fn test_relay_engine_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/bilibili"))
            .and(query_param("term", "cat"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"code": 0, "result": {"tag": [{"value": "cat"}, {"value": "catgirl"}]}}"#,
            ))
            .mount(&server)
            .await;

        let mut registry = EngineRegistry::new();
        registry
            .register(EngineConfig::relay(SearchEngine::Bilibili, "/api/bilibili"))
            .unwrap();

        let client = client_for(registry, server.uri());
        let result = client.suggest(SearchEngine::Bilibili, "cat").await.unwrap();
        assert_eq!(result.suggestions, vec!["cat", "catgirl"]);
    }

    #[tokio::test]
    async fn test_relay_masked_failure_degrades_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/bilibili"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"error": "Failed to fetch suggestions", "code": -1, "result": {"tag": []}}"#,
            ))
            .mount(&server)
            .await;

        let mut registry = EngineRegistry::new();
        registry
            .register(EngineConfig::relay(SearchEngine::Bilibili, "/api/bilibili"))
            .unwrap();

        let client = client_for(registry, server.uri());
        let result = client.suggest(SearchEngine::Bilibili, "cat").await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_relay_http_error_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/bilibili"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let mut registry = EngineRegistry::new();
        registry
            .register(EngineConfig::relay(SearchEngine::Bilibili, "/api/bilibili"))
            .unwrap();

        let client = client_for(registry, server.uri());
        let err = client
            .suggest(SearchEngine::Bilibili, "cat")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SuggestError::Transport(LoadError::Status(502))
        ));
    }

    #[tokio::test]
    async fn test_unregistered_engine_is_config_error() {
        let client = client_for(EngineRegistry::new(), String::new());
        let err = client.suggest(SearchEngine::Bing, "cat").await.unwrap_err();
        assert!(matches!(
            err,
            SuggestError::Config(ConfigError::NotRegistered(SearchEngine::Bing))
        ));
    }
}
