//! In-process `KeyValueStore` with per-entry expiry.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use agira_contracts::error::{AgiraError, AgiraResult};
use agira_core::traits::KeyValueStore;

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Expired entries are dropped by the read that finds them and by every
/// write, so keys that are never read again do not accumulate.
/// Clones share the same entries.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AgiraResult<std::sync::MutexGuard<'_, HashMap<String, Entry>>> {
        self.entries.lock().map_err(|e| AgiraError::CacheBackend {
            reason: format!("cache lock poisoned: {}", e),
        })
    }
}

impl KeyValueStore for InMemoryStore {
    fn ping(&self) -> AgiraResult<()> {
        self.lock().map(|_| ())
    }

    fn get(&self, key: &str) -> AgiraResult<Option<String>> {
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> AgiraResult<()> {
        // Redis rejects SETEX with a zero TTL.
        if ttl_seconds == 0 {
            return Err(AgiraError::CacheBackend {
                reason: "invalid expire time in 'setex' command".to_string(),
            });
        }
        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(ttl_seconds))
            .ok_or_else(|| AgiraError::CacheBackend {
                reason: format!("ttl of {} seconds is out of range", ttl_seconds),
            })?;

        let mut entries = self.lock()?;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.entries.lock().map(|e| e.len()).unwrap_or(0);
        f.debug_struct("InMemoryStore").field("entries", &len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let store = InMemoryStore::new();
        store.set_ex("k", "v", 60).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn last_write_wins() {
        let store = InMemoryStore::new();
        store.set_ex("k", "one", 60).unwrap();
        store.set_ex("k", "two", 60).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn expired_entries_are_misses() {
        let store = InMemoryStore::new();
        store.set_ex("k", "v", 60).unwrap();
        {
            let mut entries = store.entries.lock().unwrap();
            let entry = entries.get_mut("k").unwrap();
            entry.expires_at = Instant::now() - Duration::from_millis(1);
        }
        assert_eq!(store.get("k").unwrap(), None);
        assert!(store.entries.lock().unwrap().is_empty());
    }

    #[test]
    fn writes_sweep_expired_entries() {
        let store = InMemoryStore::new();
        store.set_ex("stale", "v", 60).unwrap();
        store.set_ex("fresh", "v", 60).unwrap();
        {
            let mut entries = store.entries.lock().unwrap();
            entries.get_mut("stale").unwrap().expires_at = Instant::now() - Duration::from_millis(1);
        }

        store.set_ex("other", "v", 60).unwrap();

        let entries = store.entries.lock().unwrap();
        assert!(!entries.contains_key("stale"));
        assert!(entries.contains_key("fresh"));
        assert!(entries.contains_key("other"));
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let store = InMemoryStore::new();
        assert!(matches!(store.set_ex("k", "v", 0), Err(AgiraError::CacheBackend { .. })));
    }
}
