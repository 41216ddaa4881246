//! Expiration Policy Module
//!
//! Decides whether a cached entry is still usable and refreshes its expiry
//! where the policy calls for it.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::Entry;
use crate::error::{CacheError, Result};

// == Validity ==
/// Outcome of a policy check on a found entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Entry may be served
    Valid,
    /// Entry must be dropped and recomputed
    Expired,
}

// == Expiration Policy ==
/// Expiration behavior shared by every entry of a cache.
///
/// | Variant   | Expired when          | Mutates expiry            |
/// |-----------|-----------------------|---------------------------|
/// | `Never`   | never                 | no                        |
/// | `Fixed`   | `now >= expires_at`   | no                        |
/// | `Sliding` | `now >= expires_at`   | yes, to `now + ttl`       |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExpirationPolicy {
    /// Entries never expire
    #[default]
    Never,
    /// Entries expire at the instant fixed when they were created
    Fixed,
    /// Every successful access pushes expiry to `now + ttl`
    Sliding {
        #[serde(rename = "ttl_ms", with = "duration_ms")]
        ttl: Duration,
    },
}

impl ExpirationPolicy {
    /// Shorthand for [`ExpirationPolicy::Sliding`].
    pub fn sliding(ttl: Duration) -> Self {
        Self::Sliding { ttl }
    }

    /// Builds a policy from its configuration name.
    ///
    /// `sliding_ttl` is only consulted for `"sliding"`.
    pub fn from_name(name: &str, sliding_ttl: Duration) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "never" | "none" => Ok(Self::Never),
            "fixed" => Ok(Self::Fixed),
            "sliding" => Ok(Self::Sliding { ttl: sliding_ttl }),
            other => Err(CacheError::Config(format!(
                "unknown expiration policy '{}'",
                other
            ))),
        }
    }

    // == Apply ==
    /// Checks `entry` at `now`, refreshing its expiry for sliding policies.
    pub fn apply<V>(&self, entry: &mut Entry<V>, now: DateTime<Utc>) -> Validity {
        match self {
            Self::Never => Validity::Valid,
            Self::Fixed => {
                if entry.is_expired_at(now) {
                    Validity::Expired
                } else {
                    Validity::Valid
                }
            }
            Self::Sliding { ttl } => {
                if entry.is_expired_at(now) {
                    return Validity::Expired;
                }
                entry.expires_at = expiry_after(now, *ttl);
                Validity::Valid
            }
        }
    }
}

impl fmt::Display for ExpirationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => write!(f, "never"),
            Self::Fixed => write!(f, "fixed"),
            Self::Sliding { ttl } => write!(f, "sliding({}ms)", ttl.num_milliseconds()),
        }
    }
}

// == Expiry Computation ==
/// Returns `now + ttl`, saturating at the representable timestamp range.
pub fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    match now.checked_add_signed(ttl) {
        Some(instant) => instant,
        None if ttl < Duration::zero() => DateTime::<Utc>::MIN_UTC,
        None => DateTime::<Utc>::MAX_UTC,
    }
}

mod duration_ms {
    use chrono::Duration;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(ttl.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = i64::deserialize(deserializer)?;
        Duration::try_milliseconds(ms).ok_or_else(|| D::Error::custom("ttl_ms out of range"))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn entry_expiring_at(expires_at: DateTime<Utc>) -> Entry<&'static str> {
        Entry::new("key", "value", expires_at)
    }

    #[test]
    fn test_never_is_always_valid() {
        let now = Utc::now();
        let mut entry = entry_expiring_at(now - Duration::days(1));

        assert_eq!(ExpirationPolicy::Never.apply(&mut entry, now), Validity::Valid);
        assert_eq!(entry.expires_at, now - Duration::days(1));
    }

    #[test]
    fn test_fixed_boundary_is_expired() {
        let t = Utc::now();
        let mut entry = entry_expiring_at(t);

        assert_eq!(
            ExpirationPolicy::Fixed.apply(&mut entry, t - Duration::milliseconds(1)),
            Validity::Valid
        );
        assert_eq!(ExpirationPolicy::Fixed.apply(&mut entry, t), Validity::Expired);
        assert_eq!(entry.expires_at, t, "Fixed policy must not move expiry");
    }

    #[test]
    fn test_sliding_extends_on_access() {
        let t0 = Utc::now();
        let ttl = Duration::seconds(60);
        let policy = ExpirationPolicy::sliding(ttl);
        let mut entry = entry_expiring_at(t0 + ttl);

        let access = t0 + Duration::seconds(20);
        assert_eq!(policy.apply(&mut entry, access), Validity::Valid);
        assert_eq!(entry.expires_at, access + ttl);

        assert_eq!(policy.apply(&mut entry, access + ttl), Validity::Expired);
    }

    #[test]
    fn test_sliding_does_not_refresh_expired_entry() {
        let t0 = Utc::now();
        let policy = ExpirationPolicy::sliding(Duration::seconds(60));
        let mut entry = entry_expiring_at(t0);

        assert_eq!(policy.apply(&mut entry, t0), Validity::Expired);
        assert_eq!(entry.expires_at, t0);
    }

    #[test]
    fn test_sliding_saturates_on_overflow() {
        let now = DateTime::<Utc>::MAX_UTC - Duration::seconds(1);
        let policy = ExpirationPolicy::sliding(Duration::days(365));
        let mut entry = entry_expiring_at(DateTime::<Utc>::MAX_UTC);

        assert_eq!(policy.apply(&mut entry, now), Validity::Valid);
        assert_eq!(entry.expires_at, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_expiry_after_saturates_both_ways() {
        let now = Utc::now();
        assert_eq!(expiry_after(now, Duration::seconds(1)), now + Duration::seconds(1));
        assert_eq!(
            expiry_after(DateTime::<Utc>::MAX_UTC, Duration::seconds(1)),
            DateTime::<Utc>::MAX_UTC
        );
        assert_eq!(
            expiry_after(DateTime::<Utc>::MIN_UTC, Duration::seconds(-1)),
            DateTime::<Utc>::MIN_UTC
        );
    }

    #[test]
    fn test_from_name() {
        let ttl = Duration::seconds(5);
        assert_eq!(
            ExpirationPolicy::from_name("never", ttl).unwrap(),
            ExpirationPolicy::Never
        );
        assert_eq!(
            ExpirationPolicy::from_name(" Fixed ", ttl).unwrap(),
            ExpirationPolicy::Fixed
        );
        assert_eq!(
            ExpirationPolicy::from_name("sliding", ttl).unwrap(),
            ExpirationPolicy::sliding(ttl)
        );
        assert!(matches!(
            ExpirationPolicy::from_name("lfu", ttl),
            Err(CacheError::Config(_))
        ));
    }

    #[test]
    fn test_serde_representation() {
        let json = serde_json::to_string(&ExpirationPolicy::sliding(Duration::seconds(2))).unwrap();
        assert_eq!(json, r#"{"kind":"sliding","ttl_ms":2000}"#);

        let parsed: ExpirationPolicy = serde_json::from_str(r#"{"kind":"fixed"}"#).unwrap();
        assert_eq!(parsed, ExpirationPolicy::Fixed);
    }
}
