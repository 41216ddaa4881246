//! Cache Store Module
//!
//! Main cache engine combining the key index, the recency ledger and the
//! expiration policy behind a single lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cache::policy::expiry_after;
use crate::cache::{
    CacheStats, Clock, Entry, ExpirationPolicy, Handle, Options, RecencyLedger, SystemClock,
    Validity,
};
use crate::error::{CacheError, Result};

/// Upper bound on slots reserved up front, whatever the capacity
const PREALLOCATE_LIMIT: usize = 1024;

/// Callback notified with every entry removed by capacity pressure.
pub type EvictionObserver<V> = Box<dyn FnMut(Entry<V>) + Send>;

pub(crate) fn noop_observer<V>() -> EvictionObserver<V> {
    Box::new(|_| {})
}

// == Locked State ==
struct Inner<V> {
    /// Entries ordered from least to most recently used
    ledger: RecencyLedger<V>,
    /// Key to ledger position
    index: HashMap<String, Handle>,
    stats: CacheStats,
    on_evict: EvictionObserver<V>,
}

impl<V: Clone> Inner<V> {
    /// Returns the value for `key` if present and still valid under `policy`.
    ///
    /// An expired entry is dropped from both ledger and index.
    fn lookup(&mut self, key: &str, policy: &ExpirationPolicy, now: DateTime<Utc>) -> Option<V> {
        let handle = *self.index.get(key)?;
        let entry = self.ledger.get_mut(handle)?;

        match policy.apply(entry, now) {
            Validity::Valid => {
                let value = entry.value.clone();
                self.ledger.move_to_most_recent(handle);
                self.stats.record_hit();
                trace!(key, "cache hit");
                Some(value)
            }
            Validity::Expired => {
                self.ledger.remove(handle);
                self.index.remove(key);
                self.stats.record_expiration();
                debug!(key, "entry expired");
                None
            }
        }
    }

    /// Evicts least recently used entries until one more fits.
    fn make_room(&mut self, capacity: usize) {
        while self.ledger.len() >= capacity {
            let Some(evicted) = self.ledger.remove_least_recent() else {
                break;
            };
            self.index.remove(&evicted.key);
            self.stats.record_eviction();
            debug!(key = %evicted.key, "evicted least recently used entry");
            (self.on_evict)(evicted);
        }
    }

    fn insert(&mut self, entry: Entry<V>) {
        let key = entry.key.clone();
        let handle = self.ledger.append(entry);
        self.index.insert(key, handle);
    }
}

// == Cache ==
/// Thread-safe memoizing cache with LRU eviction.
///
/// Every operation takes one mutex for its whole duration, including the
/// producer passed to [`Cache::get_or_add`]. At most one producer runs per
/// cache at a time, and a slow producer stalls every other caller. A
/// producer must not call back into the same cache: the lock is not
/// reentrant and the call would deadlock.
///
/// Share across threads with `Arc<Cache<V>>`.
pub struct Cache<V> {
    inner: Mutex<Inner<V>>,
    capacity: usize,
    policy: ExpirationPolicy,
    clock: Arc<dyn Clock>,
}

impl<V> Cache<V> {
    // == Constructor ==
    /// Creates a cache from `options`, using the system clock and no
    /// eviction observer.
    pub fn new(options: Options) -> Self {
        Self::from_parts(options, Arc::new(SystemClock), noop_observer())
    }

    pub(crate) fn from_parts(
        options: Options,
        clock: Arc<dyn Clock>,
        on_evict: EvictionObserver<V>,
    ) -> Self {
        let capacity = options.effective_capacity();
        debug!(capacity, policy = %options.policy, "cache created");

        Self {
            inner: Mutex::new(Inner {
                ledger: RecencyLedger::with_capacity(capacity.min(PREALLOCATE_LIMIT)),
                index: HashMap::with_capacity(capacity.min(PREALLOCATE_LIMIT)),
                stats: CacheStats::new(),
                on_evict,
            }),
            capacity,
            policy: options.policy,
            clock,
        }
    }

    /// Replaces the eviction observer.
    pub fn set_eviction_observer<F>(&self, observer: F)
    where
        F: FnMut(Entry<V>) + Send + 'static,
    {
        self.inner.lock().on_evict = Box::new(observer);
    }

    // == Remove ==
    /// Removes `key` and returns its value, expired or not.
    ///
    /// The eviction observer is not notified.
    pub fn remove(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();
        let handle = inner.index.remove(key)?;
        inner.ledger.remove(handle).map(|entry| entry.value)
    }

    // == Clear ==
    /// Drops every entry without notifying the eviction observer.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.ledger.clear();
        inner.index.clear();
    }

    // == Inspection ==
    /// Checks presence without consulting the policy or touching recency.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().index.contains_key(key)
    }

    /// Returns the stored expiry of `key` without consulting the policy.
    pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        let inner = self.inner.lock();
        let handle = *inner.index.get(key)?;
        inner.ledger.get(handle).map(|entry| entry.expires_at)
    }

    /// Keys ordered from least to most recently used.
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .lock()
            .ledger
            .iter()
            .map(|entry| entry.key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().ledger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> ExpirationPolicy {
        self.policy
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.ledger.len());
        stats
    }
}

impl<V: Clone> Cache<V> {
    // == Get Or Add ==
    /// Returns the cached value for `key`, producing and storing it on a miss.
    ///
    /// On a hit the policy may refresh the entry's expiry and the entry
    /// becomes most recently used. On a miss, or when the policy reports
    /// the entry expired, the least recently used entry is evicted if the
    /// cache is full, then `create` runs and its result is stored with an
    /// expiry of `now + ttl`.
    ///
    /// # Errors
    /// [`CacheError::InvalidKey`] if `key` is empty. The producer is not
    /// invoked in that case.
    pub fn get_or_add<F>(&self, key: &str, ttl: Duration, create: F) -> Result<V>
    where
        F: FnOnce() -> V,
    {
        validate_key(key)?;

        let mut inner = self.inner.lock();
        let now = self.clock.now();

        if let Some(value) = inner.lookup(key, &self.policy, now) {
            return Ok(value);
        }

        inner.stats.record_miss();
        trace!(key, "cache miss");
        inner.make_room(self.capacity);

        let expires_at = expiry_after(now, ttl);
        let value = create();
        inner.insert(Entry::new(key, value.clone(), expires_at));

        Ok(value)
    }

    // == Try Get Or Add ==
    /// Like [`Cache::get_or_add`] with a fallible producer.
    ///
    /// A producer error is returned unchanged and nothing is stored. Room
    /// for the new entry is only made once the producer has succeeded, so
    /// a failed call never evicts another key.
    pub fn try_get_or_add<E, F>(&self, key: &str, ttl: Duration, create: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
        E: From<CacheError>,
    {
        validate_key(key)?;

        let mut inner = self.inner.lock();
        let now = self.clock.now();

        if let Some(value) = inner.lookup(key, &self.policy, now) {
            return Ok(value);
        }

        inner.stats.record_miss();
        trace!(key, "cache miss");

        let expires_at = expiry_after(now, ttl);
        let value = match create() {
            Ok(value) => value,
            Err(err) => {
                debug!(key, "producer failed, nothing cached");
                return Err(err);
            }
        };

        inner.make_room(self.capacity);
        inner.insert(Entry::new(key, value.clone(), expires_at));

        Ok(value)
    }
}

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .field("len", &self.inner.try_lock().map(|inner| inner.ledger.len()))
            .finish()
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("key must not be empty".to_string()));
    }
    Ok(())
}
