//! Engine catalog: supported engines, transports, and URL templates

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

/// Placeholder for the URL-encoded search term in a script URL template
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Placeholder for the callback name in a script URL template
pub const CALLBACK_PLACEHOLDER: &str = "{callback}";

/// Engines the suggestion box can query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    Google,
    Baidu,
    Bing,
    DuckDuckGo,
    Bilibili,
}

impl SearchEngine {
    /// All supported engines, in settings-UI order
    pub const ALL: [SearchEngine; 5] = [
        SearchEngine::Google,
        SearchEngine::Baidu,
        SearchEngine::Bing,
        SearchEngine::DuckDuckGo,
        SearchEngine::Bilibili,
    ];

    /// Lowercase identifier used in settings files, relay paths, and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchEngine::Google => "google",
            SearchEngine::Baidu => "baidu",
            SearchEngine::Bing => "bing",
            SearchEngine::DuckDuckGo => "duckduckgo",
            SearchEngine::Bilibili => "bilibili",
        }
    }

    /// Look up an engine by its identifier
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "google" => Some(SearchEngine::Google),
            "baidu" => Some(SearchEngine::Baidu),
            "bing" => Some(SearchEngine::Bing),
            "duckduckgo" | "ddg" => Some(SearchEngine::DuckDuckGo),
            "bilibili" => Some(SearchEngine::Bilibili),
            _ => None,
        }
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a suggestion query reaches its engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Script-callback: the engine's response body invokes a caller-named
    /// callback with the payload as its argument
    ScriptCallback,
    /// First-party relay: the engine refuses direct cross-origin queries,
    /// so requests go through our own forwarding endpoint
    Relay,
}

/// Engine configuration faults, raised at registration or on a URL build
/// that does not match the declared transport
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("engine {0} is not registered")]
    NotRegistered(SearchEngine),
    #[error("engine {0} is already registered")]
    Duplicate(SearchEngine),
    #[error("engine {engine}: {transport:?} transport requires `{field}`")]
    MissingLocator {
        engine: SearchEngine,
        transport: Transport,
        field: &'static str,
    },
    #[error("engine {engine}: `{field}` is not valid for {transport:?} transport")]
    ForeignLocator {
        engine: SearchEngine,
        transport: Transport,
        field: &'static str,
    },
    #[error("engine {engine}: URL template is missing the `{placeholder}` placeholder")]
    MissingPlaceholder {
        engine: SearchEngine,
        placeholder: &'static str,
    },
    #[error("engine {engine}: URL template does not form a valid URL: {source}")]
    InvalidTemplate {
        engine: SearchEngine,
        source: url::ParseError,
    },
    #[error("engine {engine}: relay path must start with '/'")]
    RelayPathNotRooted { engine: SearchEngine },
    #[error("engine {engine}: {requested:?} URL requested but engine uses {configured:?}")]
    TransportMismatch {
        engine: SearchEngine,
        requested: Transport,
        configured: Transport,
    },
}

/// Transport contract for one engine
///
/// Exactly one of `url_template` / `relay_path` is populated, matching
/// `transport`. `EngineRegistry` enforces this at registration, so a
/// malformed entry fails at startup rather than mid-query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine identity
    pub engine: SearchEngine,
    /// Declared transport
    pub transport: Transport,
    /// Script URL template with `{query}` and `{callback}` placeholders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_template: Option<String>,
    /// Relay path, queried as `<relay_path>?term=<term>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_path: Option<String>,
}

impl EngineConfig {
    /// Config for a script-callback engine
    pub fn script(engine: SearchEngine, template: impl Into<String>) -> Self {
        Self {
            engine,
            transport: Transport::ScriptCallback,
            url_template: Some(template.into()),
            relay_path: None,
        }
    }

    /// Config for a relayed engine
    pub fn relay(engine: SearchEngine, path: impl Into<String>) -> Self {
        Self {
            engine,
            transport: Transport::Relay,
            url_template: None,
            relay_path: Some(path.into()),
        }
    }

    /// Validate the registration invariants for this config
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.transport {
            Transport::ScriptCallback => {
                let template =
                    self.url_template
                        .as_deref()
                        .ok_or(ConfigError::MissingLocator {
                            engine: self.engine,
                            transport: self.transport,
                            field: "url_template",
                        })?;
                if self.relay_path.is_some() {
                    return Err(ConfigError::ForeignLocator {
                        engine: self.engine,
                        transport: self.transport,
                        field: "relay_path",
                    });
                }
                for placeholder in [QUERY_PLACEHOLDER, CALLBACK_PLACEHOLDER] {
                    if !template.contains(placeholder) {
                        return Err(ConfigError::MissingPlaceholder {
                            engine: self.engine,
                            placeholder,
                        });
                    }
                }
                // A template that cannot form an absolute URL would fail
                // every query; catch it at registration instead.
                let sample = template
                    .replace(QUERY_PLACEHOLDER, "q")
                    .replace(CALLBACK_PLACEHOLDER, "cb");
                Url::parse(&sample).map_err(|source| ConfigError::InvalidTemplate {
                    engine: self.engine,
                    source,
                })?;
            }
            Transport::Relay => {
                let path = self
                    .relay_path
                    .as_deref()
                    .ok_or(ConfigError::MissingLocator {
                        engine: self.engine,
                        transport: self.transport,
                        field: "relay_path",
                    })?;
                if self.url_template.is_some() {
                    return Err(ConfigError::ForeignLocator {
                        engine: self.engine,
                        transport: self.transport,
                        field: "url_template",
                    });
                }
                if !path.starts_with('/') {
                    return Err(ConfigError::RelayPathNotRooted {
                        engine: self.engine,
                    });
                }
            }
        }
        Ok(())
    }

    /// Build the script URL for `term`, with `callback` substituted verbatim
    ///
    /// The term is URL-encoded exactly once, here. Fails eagerly when the
    /// engine is not a script-callback engine.
    pub fn script_url(&self, term: &str, callback: &str) -> Result<String, ConfigError> {
        if self.transport != Transport::ScriptCallback {
            return Err(ConfigError::TransportMismatch {
                engine: self.engine,
                requested: Transport::ScriptCallback,
                configured: self.transport,
            });
        }
        let template = self
            .url_template
            .as_deref()
            .ok_or(ConfigError::MissingLocator {
                engine: self.engine,
                transport: self.transport,
                field: "url_template",
            })?;
        Ok(template
            .replace(QUERY_PLACEHOLDER, &urlencoding::encode(term))
            .replace(CALLBACK_PLACEHOLDER, callback))
    }

    /// Build the relay request path for `term`
    ///
    /// Fails eagerly when the engine is not relayed.
    pub fn relay_url(&self, term: &str) -> Result<String, ConfigError> {
        if self.transport != Transport::Relay {
            return Err(ConfigError::TransportMismatch {
                engine: self.engine,
                requested: Transport::Relay,
                configured: self.transport,
            });
        }
        let path = self
            .relay_path
            .as_deref()
            .ok_or(ConfigError::MissingLocator {
                engine: self.engine,
                transport: self.transport,
                field: "relay_path",
            })?;
        Ok(format!("{}?term={}", path, urlencoding::encode(term)))
    }
}

/// Built-in engine catalog
///
/// Fixed at process start; a settings file may replace it, subject to the
/// same validation.
pub fn builtin_engines() -> &'static [EngineConfig] {
    static CATALOG: Lazy<Vec<EngineConfig>> = Lazy::new(|| {
        vec![
            EngineConfig::script(
                SearchEngine::Google,
                "https://suggestqueries.google.com/complete/search?client=youtube&q={query}&jsonp={callback}",
            ),
            EngineConfig::script(
                SearchEngine::Baidu,
                "https://sp0.baidu.com/5a1Fazu8AA54nxGko9WTAnF6hhy/su?wd={query}&cb={callback}",
            ),
            EngineConfig::script(
                SearchEngine::Bing,
                "https://api.bing.com/osjson.aspx?query={query}&JsonType=callback&JsonCallback={callback}",
            ),
            EngineConfig::script(
                SearchEngine::DuckDuckGo,
                "https://duckduckgo.com/ac/?q={query}&callback={callback}&type=list",
            ),
            EngineConfig::relay(SearchEngine::Bilibili, "/api/bilibili"),
        ]
    });
    CATALOG.as_slice()
}
