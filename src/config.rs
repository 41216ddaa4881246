//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;

use chrono::Duration;

use crate::cache::{ExpirationPolicy, Options, DEFAULT_CAPACITY};
use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of live entries
    pub capacity: usize,
    /// Expiration policy shared by all entries
    pub policy: ExpirationPolicy,
    /// TTL in seconds passed with each request
    pub default_ttl: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum entries; zero, negative or unparsable means 100
    /// - `CACHE_POLICY` - `never`, `fixed` or `sliding` (default: never)
    /// - `CACHE_SLIDING_TTL_SECS` - Window for the sliding policy (default: 60)
    /// - `CACHE_DEFAULT_TTL_SECS` - TTL passed with each request (default: 300)
    ///
    /// # Errors
    /// [`CacheError::Config`] if `CACHE_POLICY` names an unknown policy.
    pub fn from_env() -> Result<Self> {
        let capacity = env::var("CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|&v| v > 0)
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(DEFAULT_CAPACITY);

        let sliding_ttl = env::var("CACHE_SLIDING_TTL_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(Duration::try_seconds)
            .unwrap_or_else(|| Duration::seconds(60));

        let policy = match env::var("CACHE_POLICY") {
            Ok(name) => ExpirationPolicy::from_name(&name, sliding_ttl)?,
            Err(env::VarError::NotPresent) => ExpirationPolicy::Never,
            Err(err) => return Err(CacheError::Config(format!("CACHE_POLICY: {}", err))),
        };

        let default_ttl = env::var("CACHE_DEFAULT_TTL_SECS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(300);

        Ok(Self {
            capacity,
            policy,
            default_ttl,
        })
    }

    /// Options to build a cache from.
    pub fn options(&self) -> Options {
        Options::new(self.capacity, self.policy)
    }

    /// TTL passed with each request.
    pub fn default_ttl(&self) -> Duration {
        Duration::try_seconds(i64::try_from(self.default_ttl).unwrap_or(i64::MAX))
            .unwrap_or(Duration::MAX)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            policy: ExpirationPolicy::Never,
            default_ttl: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 4] = [
        "CACHE_CAPACITY",
        "CACHE_POLICY",
        "CACHE_SLIDING_TTL_SECS",
        "CACHE_DEFAULT_TTL_SECS",
    ];

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.capacity, 100);
        assert_eq!(config.policy, ExpirationPolicy::Never);
        assert_eq!(config.default_ttl, 300);
        assert_eq!(config.default_ttl(), Duration::seconds(300));
    }

    #[test]
    fn test_config_options() {
        let config = Config {
            capacity: 8,
            policy: ExpirationPolicy::Fixed,
            default_ttl: 10,
        };
        assert_eq!(config.options(), Options::new(8, ExpirationPolicy::Fixed));
    }

    // Environment variables are process-wide, so every env scenario runs in
    // one test to keep parallel tests from interfering.
    #[test]
    fn test_config_from_env() {
        for var in VARS {
            env::remove_var(var);
        }
        assert_eq!(Config::from_env().unwrap(), Config::default());

        env::set_var("CACHE_CAPACITY", "-5");
        assert_eq!(Config::from_env().unwrap().capacity, 100);

        env::set_var("CACHE_CAPACITY", "25");
        env::set_var("CACHE_POLICY", "sliding");
        env::set_var("CACHE_SLIDING_TTL_SECS", "15");
        env::set_var("CACHE_DEFAULT_TTL_SECS", "30");
        let config = Config::from_env().unwrap();
        assert_eq!(config.capacity, 25);
        assert_eq!(config.policy, ExpirationPolicy::sliding(Duration::seconds(15)));
        assert_eq!(config.default_ttl, 30);

        env::set_var("CACHE_POLICY", "random");
        assert!(matches!(Config::from_env(), Err(CacheError::Config(_))));

        for var in VARS {
            env::remove_var(var);
        }
    }
}
