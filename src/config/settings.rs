//! Settings structures for aerostart-rs configuration

use crate::engines::{builtin_engines, EngineConfig, SearchEngine};
use crate::network::DEFAULT_USER_AGENT;
use crate::storage::{DEFAULT_DEBOUNCE, DEFAULT_QUOTA_BYTES};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main settings structure matching aerostart.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
    pub suggest: SuggestSettings,
    pub relay: RelaySettings,
    pub storage: StorageSettings,
    pub engines: Vec<EngineConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            outgoing: OutgoingSettings::default(),
            suggest: SuggestSettings::default(),
            relay: RelaySettings::default(),
            storage: StorageSettings::default(),
            engines: builtin_engines().to_vec(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (AEROSTART_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("AEROSTART_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("AEROSTART_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Ok(val) = std::env::var("AEROSTART_RELAY_BASE") {
            self.suggest.relay_base = val;
        }
        if let Ok(val) = std::env::var("AEROSTART_STORAGE_DIR") {
            self.storage.dir = Some(PathBuf::from(val));
        }
    }

    /// Get engine config by identity
    pub fn engine(&self, engine: SearchEngine) -> Option<&EngineConfig> {
        self.engines.iter().find(|e| e.engine == engine)
    }
}

/// Relay server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8889,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Pool max size
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// User agent string (none = browser-equivalent default)
    pub user_agent: Option<String>,
    /// Proxy URL for all outgoing requests
    pub proxy: Option<String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 5.0,
            pool_maxsize: 20,
            verify_ssl: true,
            user_agent: None,
            proxy: None,
        }
    }
}

/// Suggestion fetch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestSettings {
    /// Per-query timeout in milliseconds
    pub timeout_ms: u64,
    /// Base URL of the first-party relay
    pub relay_base: String,
}

impl Default for SuggestSettings {
    fn default() -> Self {
        Self {
            timeout_ms: crate::DEFAULT_TIMEOUT_MS,
            relay_base: "http://127.0.0.1:8889".to_string(),
        }
    }
}

/// Relay service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Seconds an upstream response stays cached
    pub cache_ttl_secs: u64,
    /// Upstream contracts, one per relayed engine
    pub upstreams: Vec<RelayUpstream>,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 60,
            upstreams: default_relay_upstreams(),
        }
    }
}

/// Upstream contract for one relayed engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayUpstream {
    /// Engine this upstream serves
    pub engine: SearchEngine,
    /// Upstream endpoint; the term is appended as a query parameter
    pub url: String,
    /// Name of the term query parameter the upstream expects
    #[serde(default = "default_term_param")]
    pub term_param: String,
    /// Fixed identification headers the upstream requires
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_term_param() -> String {
    "term".to_string()
}

/// Settings store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Storage directory (none = platform config dir)
    pub dir: Option<PathBuf>,
    /// Quota ceiling for total occupied storage, in bytes
    pub quota_bytes: u64,
    /// Write-coalescing window in milliseconds
    pub debounce_ms: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dir: None,
            quota_bytes: DEFAULT_QUOTA_BYTES,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
        }
    }
}

/// Default upstream contracts for the relayed engines
fn default_relay_upstreams() -> Vec<RelayUpstream> {
    vec![RelayUpstream {
        engine: SearchEngine::Bilibili,
        url: "https://s.search.bilibili.com/main/suggest".to_string(),
        term_param: "term".to_string(),
        headers: HashMap::from([
            ("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string()),
            ("Referer".to_string(), "https://www.bilibili.com".to_string()),
        ]),
    }]
}
