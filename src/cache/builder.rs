//! Cache construction: plain options and a builder for the injectable parts.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::store::{noop_observer, EvictionObserver};
use crate::cache::{Cache, Clock, Entry, ExpirationPolicy, SystemClock};

/// Capacity used when none (or zero) is configured.
pub const DEFAULT_CAPACITY: usize = 100;

// == Options ==
/// Recognized cache options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Maximum number of live entries; zero means [`DEFAULT_CAPACITY`]
    pub capacity: usize,
    /// Expiration behavior shared by every entry
    pub policy: ExpirationPolicy,
}

impl Options {
    pub fn new(capacity: usize, policy: ExpirationPolicy) -> Self {
        Self { capacity, policy }
    }

    /// Capacity after applying the default for unset values.
    pub fn effective_capacity(&self) -> usize {
        if self.capacity > 0 {
            self.capacity
        } else {
            DEFAULT_CAPACITY
        }
    }
}

// == Builder ==
/// Builder for configuring a [`Cache`].
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use memo_lru::cache::{CacheBuilder, ExpirationPolicy};
///
/// let cache = CacheBuilder::new()
///     .capacity(1000)
///     .policy(ExpirationPolicy::Fixed)
///     .build();
///
/// let value = cache
///     .get_or_add("key", Duration::minutes(1), || "value".to_string())
///     .unwrap();
/// assert_eq!(value, "value");
/// ```
pub struct CacheBuilder<V> {
    options: Options,
    clock: Option<Arc<dyn Clock>>,
    on_evict: Option<EvictionObserver<V>>,
}

impl<V> CacheBuilder<V> {
    pub fn new() -> Self {
        Self::from_options(Options::default())
    }

    pub fn from_options(options: Options) -> Self {
        Self {
            options,
            clock: None,
            on_evict: None,
        }
    }

    /// Set the maximum number of live entries.
    ///
    /// Default: 100
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.options.capacity = capacity;
        self
    }

    /// Set the expiration policy.
    ///
    /// Default: [`ExpirationPolicy::Never`]
    pub fn policy(mut self, policy: ExpirationPolicy) -> Self {
        self.options.policy = policy;
        self
    }

    /// Set the time source. Default: [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the callback run with each entry evicted by capacity pressure.
    pub fn on_evict<F>(mut self, observer: F) -> Self
    where
        F: FnMut(Entry<V>) + Send + 'static,
    {
        self.on_evict = Some(Box::new(observer));
        self
    }

    /// Build the cache with the configured settings.
    pub fn build(self) -> Cache<V> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let on_evict = self.on_evict.unwrap_or_else(noop_observer);
        Cache::from_parts(self.options, clock, on_evict)
    }
}

impl<V> Default for CacheBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_options_default_capacity() {
        assert_eq!(Options::default().effective_capacity(), DEFAULT_CAPACITY);
        assert_eq!(Options::new(0, ExpirationPolicy::Never).effective_capacity(), 100);
        assert_eq!(Options::new(7, ExpirationPolicy::Never).effective_capacity(), 7);
    }

    #[test]
    fn test_options_deserialize_partial() {
        let options: Options = serde_json::from_str(r#"{"capacity":5}"#).unwrap();
        assert_eq!(options, Options::new(5, ExpirationPolicy::Never));
    }

    #[test]
    fn test_builder_default() {
        let cache: Cache<u32> = CacheBuilder::new().build();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), DEFAULT_CAPACITY);
        assert_eq!(cache.policy(), ExpirationPolicy::Never);
    }

    #[test]
    fn test_builder_full_config() {
        let evictions = Arc::new(AtomicUsize::new(0));
        let counter = evictions.clone();
        let clock = Arc::new(ManualClock::default());

        let cache: Cache<u32> = CacheBuilder::new()
            .capacity(1)
            .policy(ExpirationPolicy::sliding(Duration::seconds(5)))
            .clock(clock.clone())
            .on_evict(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.policy(), ExpirationPolicy::sliding(Duration::seconds(5)));

        cache.get_or_add("a", Duration::seconds(5), || 1).unwrap();
        cache.get_or_add("b", Duration::seconds(5), || 2).unwrap();
        assert_eq!(evictions.load(Ordering::SeqCst), 1);
        assert_eq!(cache.expires_at("b"), Some(clock.now() + Duration::seconds(5)));
    }
}
