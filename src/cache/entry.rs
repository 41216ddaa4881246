//! Cache Entry Module
//!
//! Defines the structure for individual cache entries.

use chrono::{DateTime, Utc};

// == Cache Entry ==
/// A single cached item.
///
/// Created on a miss, mutated in place by the expiration policy on a hit,
/// and handed to the eviction observer when capacity pressure removes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<V> {
    /// Key the entry is indexed under
    pub key: String,
    /// Producer-supplied payload
    pub value: V,
    /// Absolute expiry instant; meaning depends on the active policy
    pub expires_at: DateTime<Utc>,
}

impl<V> Entry<V> {
    // == Constructor ==
    pub fn new(key: impl Into<String>, value: V, expires_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            value,
            expires_at,
        }
    }

    // == Is Expired At ==
    /// Checks whether the entry is expired at `now`.
    ///
    /// Boundary condition: the expiry instant itself counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Returns the time left before expiry at `now`, clamped to zero.
    pub fn ttl_remaining_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        if self.expires_at > now {
            self.expires_at - now
        } else {
            chrono::Duration::zero()
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_entry_creation() {
        let now = Utc::now();
        let entry = Entry::new("key", "value", now + Duration::minutes(1));

        assert_eq!(entry.key, "key");
        assert_eq!(entry.value, "value");
        assert!(!entry.is_expired_at(now));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Utc::now();
        let entry = Entry::new("key", 1, now);

        assert!(entry.is_expired_at(now), "Entry should be expired at boundary");
        assert!(!entry.is_expired_at(now - Duration::nanoseconds(1)));
    }

    #[test]
    fn test_ttl_remaining() {
        let now = Utc::now();
        let entry = Entry::new("key", (), now + Duration::seconds(10));

        assert_eq!(entry.ttl_remaining_at(now), Duration::seconds(10));
        assert_eq!(
            entry.ttl_remaining_at(now + Duration::seconds(4)),
            Duration::seconds(6)
        );
    }

    #[test]
    fn test_ttl_remaining_expired() {
        let now = Utc::now();
        let entry = Entry::new("key", (), now);

        assert_eq!(
            entry.ttl_remaining_at(now + Duration::seconds(5)),
            Duration::zero()
        );
    }
}
