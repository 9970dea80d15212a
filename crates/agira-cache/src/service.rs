//! `AgentCacheService`: best-effort response cache in front of AI agents.
//!
//! The service is either `Disabled` or `Enabled` over a `KeyValueStore`. It is
//! decided once at construction: a store that fails its PING leaves the
//! service disabled for its whole lifetime. Store errors raised later are
//! logged and turned into a miss (`get`) or `false` (`set`); nothing the
//! store does ever reaches the caller.

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use agira_contracts::{
    cache::{AgentCacheConfig, DEFAULT_AGENT_VERSION, DEFAULT_KEY_STRATEGY, DEFAULT_TTL_SECONDS},
    config::CacheSettings,
};
use agira_core::traits::KeyValueStore;

use crate::redis_store::RedisStore;

/// Namespace prefix of every agent cache key.
pub const KEY_NAMESPACE: &str = "aiagent";

/// `aiagent:{agent}:v{version}:{sha256hex(input)}`.
///
/// A pure function of its arguments; changing any one of them changes the key.
pub fn build_cache_key(agent_name: &str, input_text: &str, agent_version: u32) -> String {
    let digest = hex::encode(Sha256::digest(input_text.as_bytes()));
    format!("{}:{}:v{}:{}", KEY_NAMESPACE, agent_name, agent_version, digest)
}

/// Read the `cache` section of an agent definition.
///
/// Each field falls back to its default on its own when it is missing or has
/// the wrong type. A definition without a `cache` object yields the defaults.
pub fn parse_cache_config(agent_definition: &Value) -> AgentCacheConfig {
    let section = agent_definition.get("cache").and_then(Value::as_object);
    let field = |name: &str| section.and_then(|s| s.get(name));

    AgentCacheConfig {
        enabled: field("enabled").and_then(Value::as_bool).unwrap_or(false),
        ttl_seconds: field("ttl_seconds")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_TTL_SECONDS),
        key_strategy: field("key_strategy")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_KEY_STRATEGY)
            .to_string(),
        agent_version: field("agent_version")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(DEFAULT_AGENT_VERSION),
    }
}

enum State {
    Disabled,
    Enabled(Box<dyn KeyValueStore>),
}

pub struct AgentCacheService {
    state: State,
}

impl AgentCacheService {
    /// A service that never caches.
    pub fn disabled() -> Self {
        Self {
            state: State::Disabled,
        }
    }

    /// Connect to Redis as described by `settings`.
    ///
    /// Never fails: a disabled setting, an unreachable server or a failed
    /// PING all produce a disabled service and a warning.
    pub fn connect(settings: &CacheSettings) -> Self {
        if !settings.enabled {
            info!("agent cache disabled by configuration");
            return Self::disabled();
        }

        match RedisStore::connect(settings) {
            Ok(store) => Self::with_store(Box::new(store)),
            Err(e) => {
                warn!(host = %settings.host, port = settings.port, error = %e, "agent cache unavailable; caching disabled");
                Self::disabled()
            }
        }
    }

    /// Use `store` if it answers a PING, otherwise stay disabled.
    pub fn with_store(store: Box<dyn KeyValueStore>) -> Self {
        match store.ping() {
            Ok(()) => {
                info!("agent cache enabled");
                Self {
                    state: State::Enabled(store),
                }
            }
            Err(e) => {
                warn!(error = %e, "agent cache store failed PING; caching disabled");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.state, State::Enabled(_))
    }

    /// Whether responses for an agent with `config` should be cached at all.
    pub fn is_cache_enabled(&self, config: Option<&AgentCacheConfig>) -> bool {
        self.is_enabled() && config.is_some_and(|c| c.enabled)
    }

    /// Look up `key`. Store errors are reported as a miss.
    pub fn get(&self, key: &str) -> Option<String> {
        let State::Enabled(store) = &self.state else {
            return None;
        };

        match store.get(key) {
            Ok(Some(value)) => {
                debug!(cache_key = %key, "agent cache hit");
                Some(value)
            }
            Ok(None) => {
                debug!(cache_key = %key, "agent cache miss");
                None
            }
            Err(e) => {
                warn!(cache_key = %key, error = %e, "agent cache read failed");
                None
            }
        }
    }

    /// Store `value` under `key` for `ttl_seconds`. Returns whether it was
    /// written.
    pub fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> bool {
        let State::Enabled(store) = &self.state else {
            return false;
        };

        match store.set_ex(key, value, ttl_seconds) {
            Ok(()) => {
                debug!(cache_key = %key, ttl_seconds, "agent response cached");
                true
            }
            Err(e) => {
                warn!(cache_key = %key, error = %e, "agent cache write failed");
                false
            }
        }
    }

    pub fn get_cached_response(
        &self,
        agent_name: &str,
        input_text: &str,
        config: Option<&AgentCacheConfig>,
    ) -> Option<String> {
        if !self.is_cache_enabled(config) {
            return None;
        }
        let config = config?;
        self.get(&build_cache_key(agent_name, input_text, config.agent_version))
    }

    pub fn cache_response(
        &self,
        agent_name: &str,
        input_text: &str,
        response: &str,
        config: Option<&AgentCacheConfig>,
    ) -> bool {
        match config {
            Some(config) if self.is_cache_enabled(Some(config)) => self.set(
                &build_cache_key(agent_name, input_text, config.agent_version),
                response,
                config.ttl_seconds,
            ),
            _ => false,
        }
    }

    /// Return the cached response, or run `compute` and cache its result.
    ///
    /// Errors from `compute` are returned unchanged and nothing is cached.
    pub fn get_or_compute<E, F>(
        &self,
        agent_name: &str,
        input_text: &str,
        config: Option<&AgentCacheConfig>,
        compute: F,
    ) -> Result<String, E>
    where
        F: FnOnce() -> Result<String, E>,
    {
        if let Some(cached) = self.get_cached_response(agent_name, input_text, config) {
            return Ok(cached);
        }
        let response = compute()?;
        self.cache_response(agent_name, input_text, &response, config);
        Ok(response)
    }
}

impl std::fmt::Debug for AgentCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentCacheService")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
