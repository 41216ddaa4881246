//! Memo LRU - an in-process memoizing cache
//!
//! Bounded capacity with least-recently-used eviction and pluggable
//! expiration (never, fixed or sliding), checked lazily on access.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{Cache, CacheBuilder, CacheStats, Entry, ExpirationPolicy, Options};
pub use config::Config;
pub use error::{CacheError, Result};
