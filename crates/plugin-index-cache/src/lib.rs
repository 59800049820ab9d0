//! Per-host-version result cache.
//!
//! Plugin listings are expensive to compute (a CI walk touches every job in a
//! view) and change rarely, so sources keep their last answer per host
//! version. Entries can expire after a configurable time-to-live; time comes
//! from an injectable [`Clock`] so expiry can be tested without sleeping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

struct CachedEntry<T> {
    value: T,
    stored_at: Instant,
}

/// Cache of values keyed by the exact host version string.
///
/// Without a TTL entries live for as long as the cache does. The lock is only
/// held for map operations, so two callers missing on the same version will
/// both compute it and the last insert wins.
pub struct VersionCache<T> {
    entries: Mutex<HashMap<String, CachedEntry<T>>>,
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> Default for VersionCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> VersionCache<T> {
    /// Create a cache whose entries never expire.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Expire entries `ttl` after they were stored.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set or clear the time-to-live.
    pub fn with_optional_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Use a different time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CachedEntry<T>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_expired(&self, entry: &CachedEntry<T>, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(entry.stored_at) >= ttl,
            None => false,
        }
    }

    /// Look up the value stored for `version`, evicting it if expired.
    pub fn get(&self, version: &str) -> Option<T> {
        let now = self.clock.now();
        let mut entries = self.lock();

        match entries.get(version) {
            Some(entry) if !self.is_expired(entry, now) => {
                debug!("Cache hit for version '{}'", version);
                return Some(entry.value.clone());
            }
            Some(_) => {}
            None => {
                debug!("Cache miss for version '{}'", version);
                return None;
            }
        }

        debug!("Cache entry for version '{}' expired", version);
        entries.remove(version);
        None
    }

    /// Store `value` for `version`, replacing any previous entry.
    pub fn insert(&self, version: &str, value: T) {
        let entry = CachedEntry {
            value,
            stored_at: self.clock.now(),
        };
        self.lock().insert(version.to_string(), entry);
    }

    /// Drop the entry for `version`. Returns true if there was one.
    pub fn invalidate(&self, version: &str) -> bool {
        self.lock().remove(version).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop expired entries and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        before - entries.len()
    }

    /// Number of stored entries, including ones that have expired but not been evicted.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
