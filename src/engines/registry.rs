//! Engine registry for suggestion transport contracts

use super::catalog::{builtin_engines, ConfigError, EngineConfig, SearchEngine, Transport};
use std::collections::HashMap;
use tracing::debug;

/// Registry of the engines the suggestion box may query
///
/// Every config is validated at registration, so a malformed entry fails
/// the process at startup rather than surfacing mid-query. The set is fixed
/// once construction finishes.
#[derive(Debug, Clone)]
pub struct EngineRegistry {
    /// Configs by engine identity
    configs: HashMap<SearchEngine, EngineConfig>,
}

impl EngineRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            configs: HashMap::new(),
        }
    }

    /// Registry holding the built-in engine catalog
    pub fn with_builtin() -> Self {
        // The built-in catalog is validated by its own tests; registration
        // cannot fail here.
        Self::from_configs(builtin_engines()).expect("built-in engine catalog is valid")
    }

    /// Build a registry from a config list, validating each entry
    pub fn from_configs(configs: &[EngineConfig]) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for config in configs {
            registry.register(config.clone())?;
        }
        Ok(registry)
    }

    /// Register an engine config
    pub fn register(&mut self, config: EngineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if self.configs.contains_key(&config.engine) {
            return Err(ConfigError::Duplicate(config.engine));
        }
        debug!(engine = %config.engine, transport = ?config.transport, "registered engine");
        self.configs.insert(config.engine, config);
        Ok(())
    }

    /// Get the config for an engine
    pub fn get(&self, engine: SearchEngine) -> Option<&EngineConfig> {
        self.configs.get(&engine)
    }

    /// Check if an engine is registered
    pub fn contains(&self, engine: SearchEngine) -> bool {
        self.configs.contains_key(&engine)
    }

    /// Registered engines, in catalog order
    pub fn engines(&self) -> Vec<SearchEngine> {
        SearchEngine::ALL
            .iter()
            .copied()
            .filter(|engine| self.configs.contains_key(engine))
            .collect()
    }

    /// Configs of engines that go through the first-party relay
    pub fn relay_engines(&self) -> Vec<&EngineConfig> {
        self.engines()
            .into_iter()
            .filter_map(|engine| self.configs.get(&engine))
            .filter(|config| config.transport == Transport::Relay)
            .collect()
    }

    /// Get number of registered engines
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
