//! Script-callback suggestion transport
//!
//! Engines that allow it are queried the way a start page embedded in a
//! browser would: name a fresh global callback, inject a transient script
//! whose URL carries the term and the callback name, and let the response
//! body invoke the callback with the payload. Per query this manager
//! registers the callback, tracks the script task, bounds the wait with a
//! timeout, and removes both again on every terminal transition, fulfilled
//! or failed.

use super::callbacks::{callback_name, CallbackNamespace, ScriptOutcome};
use super::error::SuggestError;
use super::models::{SuggestionQuery, SuggestionResult};
use super::script::{extract_payload, LoadError, ScriptLoader};
use crate::engines::{parse_suggestions, ConfigError, EngineRegistry, SearchEngine};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Issues suggestion queries over the script-callback transport
///
/// Overlapping queries coexist, each under its own callback name; a new
/// query never cancels an in-flight one, and completions resolve in
/// completion order.
pub struct TransportManager {
    registry: Arc<EngineRegistry>,
    loader: Arc<dyn ScriptLoader>,
    callbacks: Arc<CallbackNamespace>,
    /// Live script tasks by callback discriminator
    scripts: Arc<Mutex<HashMap<u64, JoinHandle<()>>>>,
}

impl TransportManager {
    /// Create a manager over `registry`, loading scripts with `loader`
    pub fn new(registry: Arc<EngineRegistry>, loader: Arc<dyn ScriptLoader>) -> Self {
        Self {
            registry,
            loader,
            callbacks: Arc::new(CallbackNamespace::new()),
            scripts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Fetch suggestions from `engine` for `term`, waiting at most `timeout`
    pub async fn query(
        &self,
        engine: SearchEngine,
        term: &str,
        timeout: Duration,
    ) -> Result<SuggestionResult, SuggestError> {
        let config = self
            .registry
            .get(engine)
            .ok_or(ConfigError::NotRegistered(engine))?;

        let query = SuggestionQuery::new(engine, term);
        let (id, pending) = self.callbacks.register();
        let callback = callback_name(id);

        let url = match config.script_url(term, &callback) {
            Ok(url) => url,
            Err(e) => {
                // Raised before anything was injected; only the registration
                // needs undoing.
                self.callbacks.unregister(id);
                return Err(e.into());
            }
        };

        debug!(engine = %engine, callback = %callback, "injecting suggestion script");
        self.inject(id, callback, url);

        let outcome = tokio::time::timeout(timeout, pending).await;
        // Terminal transition: registration and script task are removed on
        // every path below, exactly once.
        self.remove(id);

        match outcome {
            Err(_) => {
                warn!(
                    engine = %engine,
                    elapsed_ms = query.elapsed_ms(),
                    "suggestion query timed out"
                );
                Err(SuggestError::Timeout(timeout))
            }
            Ok(Err(_)) => Err(SuggestError::Transport(LoadError::Discarded)),
            Ok(Ok(ScriptOutcome::LoadFailed(e))) => {
                warn!(engine = %engine, error = %e, "suggestion script failed to load");
                Err(SuggestError::Transport(e))
            }
            Ok(Ok(ScriptOutcome::Invoked(payload))) => {
                let suggestions = parse_suggestions(engine, &payload)?;
                debug!(
                    engine = %engine,
                    count = suggestions.len(),
                    elapsed_ms = query.elapsed_ms(),
                    "suggestions delivered"
                );
                Ok(SuggestionResult::new(engine, term, suggestions))
            }
        }
    }

    /// Spawn the transient script task for query `id`
    fn inject(&self, id: u64, callback: String, url: String) {
        let loader = Arc::clone(&self.loader);
        let callbacks = Arc::clone(&self.callbacks);
        let scripts = Arc::clone(&self.scripts);
        let handle = tokio::spawn(async move {
            match loader.load(&url).await {
                Ok(body) => match extract_payload(&body, &callback) {
                    Some(payload) => {
                        callbacks.dispatch(id, ScriptOutcome::Invoked(payload));
                    }
                    None => {
                        // The script ran without invoking our callback; the
                        // owning query runs into its timeout, as it would in
                        // a browser.
                        debug!(callback = %callback, "script body did not invoke the callback");
                    }
                },
                Err(e) => {
                    callbacks.dispatch(id, ScriptOutcome::LoadFailed(e));
                }
            }
            scripts.lock().unwrap().remove(&id);
        });
        self.scripts.lock().unwrap().insert(id, handle);
    }

    /// Remove query `id`'s callback registration and script task; idempotent
    fn remove(&self, id: u64) {
        self.callbacks.unregister(id);
        if let Some(handle) = self.scripts.lock().unwrap().remove(&id) {
            handle.abort();
        }
    }

    /// Callbacks still awaited by in-flight queries
    pub fn pending_callbacks(&self) -> usize {
        self.callbacks.len()
    }

    /// Script tasks not yet removed
    pub fn pending_scripts(&self) -> usize {
        self.scripts.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::EngineConfig;
    use async_trait::async_trait;
    use url::Url;

    /// Loader that answers every URL by invoking its `cb` parameter with a
    /// fixed payload, recording the URLs it saw.
    struct EchoLoader {
        payload: String,
        urls: Mutex<Vec<String>>,
    }

    impl EchoLoader {
        fn new(payload: impl Into<String>) -> Self {
            Self {
                payload: payload.into(),
                urls: Mutex::new(Vec::new()),
            }
        }

        fn callback_params(&self) -> Vec<String> {
            self.urls
                .lock()
                .unwrap()
                .iter()
                .map(|url| {
                    Url::parse(url)
                        .unwrap()
                        .query_pairs()
                        .find(|(k, _)| k == "cb")
                        .map(|(_, v)| v.to_string())
                        .unwrap()
                })
                .collect()
        }
    }

    #[async_trait]
    impl ScriptLoader for EchoLoader {
        async fn load(&self, url: &str) -> Result<String, LoadError> {
            self.urls.lock().unwrap().push(url.to_string());
            let callback = Url::parse(url)
                .unwrap()
                .query_pairs()
                .find(|(k, _)| k == "cb")
                .map(|(_, v)| v.to_string())
                .unwrap();
            Ok(format!("{}({});", callback, self.payload))
        }
    }

    /// Loader whose scripts never finish loading.
    struct NeverLoads;

    #[async_trait]
    impl ScriptLoader for NeverLoads {
        async fn load(&self, _url: &str) -> Result<String, LoadError> {
            std::future::pending().await
        }
    }

    /// Loader that fails every load with the given status.
    struct FailingLoader(u16);

    #[async_trait]
    impl ScriptLoader for FailingLoader {
        async fn load(&self, _url: &str) -> Result<String, LoadError> {
            Err(LoadError::Status(self.0))
        }
    }

    /// Loader returning a body that never invokes the callback.
    struct SilentLoader;

    #[async_trait]
    impl ScriptLoader for SilentLoader {
        async fn load(&self, _url: &str) -> Result<String, LoadError> {
            Ok("console.log('no suggestions here');".to_string())
        }
    }

    fn test_registry() -> Arc<EngineRegistry> {
        let mut registry = EngineRegistry::new();
        registry
            .register(EngineConfig::script(
                SearchEngine::Google,
                "https://suggest.test/complete?q={query}&cb={callback}",
            ))
            .unwrap();
        registry
            .register(EngineConfig::relay(SearchEngine::Bilibili, "/api/bilibili"))
            .unwrap();
        Arc::new(registry)
    }

    fn manager(loader: impl ScriptLoader + 'static) -> TransportManager {
        TransportManager::new(test_registry(), Arc::new(loader))
    }

    #[tokio::test]
    async fn test_fulfilled_query_cleans_up() {
        let manager = manager(EchoLoader::new(
            r#"["rust", [["rust lang", 0], ["rust book", 0]]]"#,
        ));
        let result = manager
            .query(SearchEngine::Google, "rust", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(result.suggestions, vec!["rust lang", "rust book"]);
        assert_eq!(result.term, "rust");
        assert_eq!(manager.pending_callbacks(), 0);
        assert_eq!(manager.pending_scripts(), 0);
    }

    #[tokio::test]
    async fn test_timeout_cleans_up() {
        let manager = manager(NeverLoads);
        let err = manager
            .query(SearchEngine::Google, "rust", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, SuggestError::Timeout(_)));
        assert_eq!(manager.pending_callbacks(), 0);
        assert_eq!(manager.pending_scripts(), 0);
    }

    #[tokio::test]
    async fn test_silent_script_times_out() {
        let manager = manager(SilentLoader);
        let err = manager
            .query(SearchEngine::Google, "rust", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, SuggestError::Timeout(_)));
        assert_eq!(manager.pending_callbacks(), 0);
    }

    #[tokio::test]
    async fn test_load_failure_cleans_up() {
        let manager = manager(FailingLoader(503));
        let err = manager
            .query(SearchEngine::Google, "rust", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SuggestError::Transport(LoadError::Status(503))
        ));
        assert_eq!(manager.pending_callbacks(), 0);
        assert_eq!(manager.pending_scripts(), 0);
    }

    #[tokio::test]
    async fn test_alien_payload_is_parse_error() {
        let manager = manager(EchoLoader::new(r#"{"weird": true}"#));
        let err = manager
            .query(SearchEngine::Google, "rust", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SuggestError::Parse(_)));
        assert_eq!(manager.pending_callbacks(), 0);
    }

    #[tokio::test]
    async fn test_transport_mismatch_is_eager_and_clean() {
        let manager = manager(EchoLoader::new("[]"));
        let err = manager
            .query(SearchEngine::Bilibili, "rust", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SuggestError::Config(ConfigError::TransportMismatch { .. })
        ));
        assert_eq!(manager.pending_callbacks(), 0);
        assert_eq!(manager.pending_scripts(), 0);
    }

    #[tokio::test]
    async fn test_unregistered_engine() {
        let manager = manager(EchoLoader::new("[]"));
        let err = manager
            .query(SearchEngine::Baidu, "rust", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SuggestError::Config(ConfigError::NotRegistered(SearchEngine::Baidu))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_queries_use_distinct_callbacks() {
        let loader = Arc::new(EchoLoader::new(r#"["q", ["one"]]"#));
        let manager = TransportManager::new(test_registry(), loader.clone());

        let a = manager.query(SearchEngine::Google, "first", Duration::from_secs(1));
        let b = manager.query(SearchEngine::Google, "second", Duration::from_secs(1));
        let (ra, rb) = tokio::join!(a, b);
        assert_eq!(ra.unwrap().suggestions, vec!["one"]);
        assert_eq!(rb.unwrap().suggestions, vec!["one"]);
        assert_eq!(manager.pending_callbacks(), 0);

        let callbacks = loader.callback_params();
        assert_eq!(callbacks.len(), 2);
        assert_ne!(callbacks[0], callbacks[1]);
    }
}
