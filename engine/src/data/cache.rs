// Time-bounded response cache owned by a market-data provider
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Key -> (value, stored-at) map; entries older than `ttl` are treated as absent.
pub struct PriceCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, (V, Instant)>>,
}

impl<V: Clone> PriceCache<V> {
    pub fn new(ttl: Duration) -> Self {
        PriceCache {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((value, stored_at)) if now.duration_since(*stored_at) < self.ttl => {
                    tracing::debug!(key, "Cache hit");
                    return Some(value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: evict under the write lock.
        let mut entries = self.entries.write().await;
        if matches!(entries.get(key), Some((_, stored_at)) if now.duration_since(*stored_at) >= self.ttl)
        {
            tracing::debug!(key, "Cache entry expired");
            entries.remove(key);
        }
        None
    }

    pub async fn insert(&self, key: impl Into<String>, value: V) {
        self.entries
            .write()
            .await
            .insert(key.into(), (value, Instant::now()));
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
