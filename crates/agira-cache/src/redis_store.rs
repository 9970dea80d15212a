//! `KeyValueStore` over a single synchronous Redis connection.

use std::{sync::Mutex, time::Duration};

use redis::{Client, Connection, RedisError};
use tracing::debug;

use agira_contracts::{
    config::CacheSettings,
    error::{AgiraError, AgiraResult},
};
use agira_core::traits::KeyValueStore;

fn backend(e: RedisError) -> AgiraError {
    AgiraError::CacheBackend {
        reason: e.to_string(),
    }
}

/// Zero means "no timeout".
fn timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

pub struct RedisStore {
    connection: Mutex<Connection>,
}

impl RedisStore {
    /// Open a connection using host, port, db, password and both timeouts
    /// from `settings`. Does not PING.
    pub fn connect(settings: &CacheSettings) -> AgiraResult<Self> {
        let client = Client::open(settings.redis_url()).map_err(backend)?;

        let connection = match timeout(settings.connect_timeout_secs) {
            Some(limit) => client.get_connection_with_timeout(limit),
            None => client.get_connection(),
        }
        .map_err(backend)?;

        let socket_timeout = timeout(settings.socket_timeout_secs);
        connection.set_read_timeout(socket_timeout).map_err(backend)?;
        connection.set_write_timeout(socket_timeout).map_err(backend)?;

        debug!(host = %settings.host, port = settings.port, db = settings.db, "redis connection opened");
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn with_connection<T>(&self, run: impl FnOnce(&mut Connection) -> redis::RedisResult<T>) -> AgiraResult<T> {
        let mut connection = self.connection.lock().map_err(|e| AgiraError::CacheBackend {
            reason: format!("redis connection lock poisoned: {}", e),
        })?;
        run(&mut *connection).map_err(backend)
    }
}

impl KeyValueStore for RedisStore {
    fn ping(&self) -> AgiraResult<()> {
        self.with_connection(|c| redis::cmd("PING").query::<String>(c))
            .map(|_| ())
    }

    fn get(&self, key: &str) -> AgiraResult<Option<String>> {
        self.with_connection(|c| redis::cmd("GET").arg(key).query(c))
    }

    fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> AgiraResult<()> {
        self.with_connection(|c| {
            redis::cmd("SETEX")
                .arg(key)
                .arg(ttl_seconds)
                .arg(value)
                .query(c)
        })
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}
