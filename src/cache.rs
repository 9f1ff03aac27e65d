//! Keyed, time-bounded memoization of backend responses.
//!
//! A [`ResponseCache`] is an explicit, injected instance — there is no
//! ambient singleton. Get/set operations are individually atomic, but the
//! get-then-execute-then-set sequence is not: two callers racing on the
//! same uncached key may both invoke the executor, and the last write wins.
//! Callers that need single-flight semantics must coordinate externally.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Cache key: operation identity plus a digest of the logical input.
///
/// Two keys collide only if operation and full SHA-256 input digest match,
/// which for distinct logical inputs would be a correctness bug, not an
/// accepted approximation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    operation: String,
    digest: String,
}

impl CacheKey {
    /// Derives a key from a stable operation name and the semantically
    /// relevant input bytes.
    pub fn new(operation: &str, input: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(input);
        let digest = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<String>();
        Self {
            operation: operation.to_string(),
            digest,
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.operation, self.digest)
    }
}

struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) < self.ttl
    }
}

/// In-memory response cache with per-entry TTL.
///
/// Cloned values are exact replays of the original computation; entries are
/// owned exclusively by the cache and evicted by expiry or explicit
/// invalidation. Growth is bounded only by TTL.
pub struct ResponseCache<T> {
    entries: Mutex<HashMap<CacheKey, CacheEntry<T>>>,
    default_ttl: Duration,
}

impl<T: Clone> ResponseCache<T> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns a fresh entry's value, if present.
    pub fn get(&self, key: &CacheKey) -> Option<T> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(Instant::now()))
            .map(|entry| entry.value.clone())
    }

    /// Stores a value under `key` with the default TTL.
    pub fn insert(&self, key: CacheKey, value: T) {
        self.insert_with_ttl(key, value, self.default_ttl);
    }

    /// Stores a value under `key`, expiring `ttl` from now.
    pub fn insert_with_ttl(&self, key: CacheKey, value: T, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Returns the cached value for `key`, or runs `executor` and caches
    /// its result with the default TTL.
    pub async fn get_or_execute<F, Fut>(&self, key: &CacheKey, executor: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.get_or_execute_with(key, self.default_ttl, false, executor)
            .await
    }

    /// [`Self::get_or_execute`] with an explicit TTL and a bypass flag.
    ///
    /// `skip_cache` forces execution but still stores the fresh result.
    /// The lock is never held across the executor await, so concurrent
    /// callers on an uncached key may both execute — the documented
    /// weak-consistency trade-off.
    pub async fn get_or_execute_with<F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        skip_cache: bool,
        executor: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !skip_cache
            && let Some(value) = self.get(key)
        {
            tracing::debug!(operation = key.operation(), "cache hit");
            return Ok(value);
        }

        tracing::debug!(operation = key.operation(), skip_cache, "cache miss");
        let value = executor().await?;
        self.insert_with_ttl(key.clone(), value.clone(), ttl);
        Ok(value)
    }

    /// Drops the entry for `key`. Returns whether one existed.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key).is_some()
    }

    /// Drops every entry belonging to one logical operation. Returns the
    /// number removed.
    pub fn invalidate_operation(&self, operation: &str) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|key, _| key.operation() != operation);
        before - entries.len()
    }

    /// Drops every entry.
    pub fn flush(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    /// Drops expired entries without touching fresh ones. Returns the
    /// number removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
