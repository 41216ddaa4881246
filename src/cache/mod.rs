//! Cache Module
//!
//! Provides an in-process memoizing cache with LRU eviction and pluggable
//! expiration.

mod builder;
mod clock;
mod entry;
mod ledger;
mod policy;
mod stats;
mod store;


// Re-export public types
pub use builder::{CacheBuilder, Options, DEFAULT_CAPACITY};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::Entry;
pub use ledger::{Handle, Iter, RecencyLedger};
pub use policy::{expiry_after, ExpirationPolicy, Validity};
pub use stats::CacheStats;
pub use store::{Cache, EvictionObserver};
