//! TTL caches for the aggregation daemon.
//!
//! Two shapes: [`TtlCell`] holds one whole value (portfolio snapshot,
//! commentary map); [`TtlMap`] holds independently-timed values per key
//! (event metadata), so a cold key refreshes without discarding warm ones.
//!
//! Both are owned by the request-handling context and passed in explicitly;
//! there is no module-level state. `TtlCell::get_or_refresh` is single-flight:
//! concurrent misses collapse into one upstream call and the waiters reuse
//! its result.
//!
//! Expiry uses `tokio::time::Instant` so tests can drive the clock with
//! `tokio::time::pause`. There is no eviction beyond TTL; key cardinality is
//! bounded by the set of tickers the account actually trades.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct Entry<T> {
    value: T,
    fetched_at: DateTime<Utc>,
    expires_at: Instant,
}

impl<T> Entry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            fetched_at: Utc::now(),
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Result of a cache lookup: the value plus where it came from.
#[derive(Clone, Debug)]
pub struct CacheLookup<T> {
    pub value: T,
    /// Wall-clock time the cached value was fetched upstream.
    pub fetched_at: DateTime<Utc>,
    /// `true` when served from cache without an upstream call.
    pub hit: bool,
}

// ---------------------------------------------------------------------------
// TtlCell: whole-object cache with single-flight refresh
// ---------------------------------------------------------------------------

/// A single cached value with a fixed TTL.
pub struct TtlCell<T> {
    ttl: Duration,
    slot: RwLock<Option<Entry<T>>>,
    /// Serializes refreshes so concurrent misses issue one upstream call.
    refresh: Mutex<()>,
}

impl<T: Clone> TtlCell<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Return the cached value if still fresh.
    pub async fn get(&self) -> Option<CacheLookup<T>> {
        let slot = self.slot.read().await;
        slot.as_ref().filter(|e| e.is_fresh()).map(|e| CacheLookup {
            value: e.value.clone(),
            fetched_at: e.fetched_at,
            hit: true,
        })
    }

    /// Return the cached value, refreshing through `fetch` when stale.
    ///
    /// `fetch` is a lazy future: it is polled only when this caller actually
    /// performs the refresh, and dropped untouched otherwise. Single-flight:
    /// under concurrent misses only one caller's future runs; the rest wait
    /// on the refresh lock and are served the refreshed entry as a hit. A
    /// failed fetch leaves any previous (stale) entry untouched and
    /// propagates the error to the caller that ran it.
    pub async fn get_or_refresh<Fut, E>(&self, fetch: Fut) -> Result<CacheLookup<T>, E>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(found) = self.get().await {
            return Ok(found);
        }

        let _flight = self.refresh.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        if let Some(found) = self.get().await {
            return Ok(found);
        }

        let value = fetch.await?;
        let entry = Entry::new(value.clone(), self.ttl);
        let fetched_at = entry.fetched_at;
        *self.slot.write().await = Some(entry);

        Ok(CacheLookup {
            value,
            fetched_at,
            hit: false,
        })
    }

    /// Drop any cached value.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }
}

// ---------------------------------------------------------------------------
// TtlMap: per-key cache
// ---------------------------------------------------------------------------

/// A keyed cache where every entry carries its own expiry.
pub struct TtlMap<V> {
    ttl: Duration,
    map: RwLock<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TtlMap<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            map: RwLock::new(HashMap::new()),
        }
    }

    /// Return the value for `key` if present and fresh.
    pub async fn get_fresh(&self, key: &str) -> Option<V> {
        let map = self.map.read().await;
        map.get(key).filter(|e| e.is_fresh()).map(|e| e.value.clone())
    }

    /// Insert or replace the value for `key`, restarting its TTL.
    pub async fn insert(&self, key: &str, value: V) {
        let mut map = self.map.write().await;
        map.insert(key.to_string(), Entry::new(value, self.ttl));
    }

    /// Partition `keys` into (fresh values, keys needing a fetch).
    ///
    /// Duplicate keys are collapsed; stale entries count as missing.
    pub async fn split_fresh(&self, keys: &[String]) -> (HashMap<String, V>, Vec<String>) {
        let map = self.map.read().await;
        let mut warm = HashMap::new();
        let mut cold = Vec::new();
        for key in keys {
            if warm.contains_key(key) || cold.contains(key) {
                continue;
            }
            match map.get(key).filter(|e| e.is_fresh()) {
                Some(e) => {
                    warm.insert(key.clone(), e.value.clone());
                }
                None => cold.push(key.clone()),
            }
        }
        (warm, cold)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
