//! Per-agent cache configuration.
//!
//! Agent definitions carry an optional `cache` section. Every field falls
//! back to its default independently, so a partial section is still usable.

use serde::{Deserialize, Serialize};

/// Cache entries expire after 90 days unless the agent says otherwise.
pub const DEFAULT_TTL_SECONDS: u64 = 7_776_000;

/// The only key strategy currently understood by the cache service.
pub const DEFAULT_KEY_STRATEGY: &str = "content_hash";

/// Version baked into cache keys when an agent does not declare one.
pub const DEFAULT_AGENT_VERSION: u32 = 1;

/// Cache behaviour declared by a single agent definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCacheConfig {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub key_strategy: String,
    /// Bumping this invalidates every cached response of the agent.
    pub agent_version: u32,
}

impl Default for AgentCacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_seconds: DEFAULT_TTL_SECONDS,
            key_strategy: DEFAULT_KEY_STRATEGY.to_string(),
            agent_version: DEFAULT_AGENT_VERSION,
        }
    }
}
