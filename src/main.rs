//! Memo LRU demo
//!
//! Runs a memoization workload against a cache configured from the
//! environment and prints the resulting statistics as JSON.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memo_lru::{Cache, CacheBuilder, Config, Entry};

const WORKERS: usize = 4;
const REQUESTS_PER_WORKER: usize = 250;

/// Main entry point for the demo.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the cache with an eviction observer
/// 4. Run the workload on several threads
/// 5. Print statistics
fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memo_lru=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("loading cache configuration")?;
    info!(
        "Configuration loaded: capacity={}, policy={}, default_ttl={}s",
        config.capacity, config.policy, config.default_ttl
    );

    let evicted = Arc::new(AtomicU64::new(0));
    let observer_count = evicted.clone();
    let cache: Arc<Cache<u64>> = Arc::new(
        CacheBuilder::from_options(config.options())
            .on_evict(move |entry: Entry<u64>| {
                observer_count.fetch_add(1, Ordering::Relaxed);
                debug!(key = %entry.key, "observer saw eviction");
            })
            .build(),
    );

    let ttl = config.default_ttl();
    let key_space = config.capacity * 2;

    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let cache = cache.clone();
            thread::spawn(move || -> memo_lru::Result<u64> {
                let mut checksum = 0u64;
                for i in 0..REQUESTS_PER_WORKER {
                    // Skewed access: low ids are requested far more often
                    let id = (i * (worker + 1)) % key_space.max(1) / (1 + i % 3);
                    let key = format!("item:{}", id);
                    checksum += cache.get_or_add(&key, ttl, || expensive_square(id as u64))?;
                }
                Ok(checksum)
            })
        })
        .collect();

    for (worker, handle) in handles.into_iter().enumerate() {
        let checksum = handle
            .join()
            .map_err(|_| anyhow::anyhow!("worker {} panicked", worker))??;
        info!("Worker {} finished, checksum={}", worker, checksum);
    }

    let stats = cache.stats();
    info!(
        "Hit rate {:.1}%, observer saw {} evictions",
        stats.hit_rate() * 100.0,
        evicted.load(Ordering::Relaxed)
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

/// Stand-in for a computation worth memoizing.
fn expensive_square(n: u64) -> u64 {
    thread::sleep(std::time::Duration::from_micros(200));
    n * n
}
