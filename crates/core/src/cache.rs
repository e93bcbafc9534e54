//! Keyed TTL cache for aggregate read models.
//!
//! An explicit cache value held in application state and injected where it is
//! needed, instead of a process-wide static. Each server instance owns its
//! own cache; entries expire after a fixed TTL and are recomputed on the next
//! read.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A mutex-guarded map of values with a shared time-to-live.
///
/// Values are cloned out on read, so `V` should be cheap to clone (or an
/// `Arc`). Expired entries are dropped lazily on access.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    /// Create an empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a live entry, dropping it if it has expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some((inserted, value)) if inserted.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert or replace an entry, restarting its TTL.
    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(key, (Instant::now(), value));
    }

    /// Drop an entry before its TTL runs out (e.g. after a write that
    /// invalidates the cached aggregate).
    pub fn invalidate(&self, key: &K) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.remove(key);
    }
}
