//! # agira-cache
//!
//! Content-addressed, TTL-bound cache for AI agent responses.
//!
//! ```text
//! AgentCacheService
//!   ├── Disabled                     never hits, never writes
//!   └── Enabled(Box<dyn KeyValueStore>)
//!         ├── RedisStore             production
//!         └── InMemoryStore          tests and local runs
//! ```
//!
//! The cache is best-effort: backend failures are logged and degrade to a
//! miss. Callers never see a cache error.

pub mod memory;
pub mod redis_store;
pub mod service;

pub use memory::InMemoryStore;
pub use redis_store::RedisStore;
pub use service::{build_cache_key, parse_cache_config, AgentCacheService, KEY_NAMESPACE};
